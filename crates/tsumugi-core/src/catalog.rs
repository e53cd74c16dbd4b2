//! Clothing catalog - variant SKU からバケットへの固定マッピング表
//!
//! 集計のバケットは (bucket_type, size) の 2 段。子供服はサイズを
//! "98/104" のようにペアで括る型番と、"128" 単独の型番が混在します
//! （サプライヤーの発注単位に合わせた表であり、規則的ではありません）。
//!
//! カタログは 2 系統に分かれます:
//! - **standard**: 非パーソナライズ品。イベント横断の週次バッチで発注する。
//! - **personalized**: イベントごとの clothing_order パイプラインで発注する。
//!
//! 表にない variant は解決できず `None`（注文には衣類以外の品も混ざるので、
//! 未解決はエラーではない）。

/// A resolved aggregation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemBucket {
    pub bucket_type: &'static str,
    pub size: &'static str,
}

struct CatalogEntry {
    variant: &'static str,
    bucket_type: &'static str,
    size: &'static str,
    /// standard（週次バッチ対象）か、personalized（イベント別発注）か。
    standard: bool,
}

const CATALOG: &[CatalogEntry] = &[
    // --- standard t-shirts (kids sizes are bundled pairs) ---
    CatalogEntry { variant: "tshirt-98", bucket_type: "tshirts", size: "98/104", standard: true },
    CatalogEntry { variant: "tshirt-104", bucket_type: "tshirts", size: "98/104", standard: true },
    CatalogEntry { variant: "tshirt-110", bucket_type: "tshirts", size: "110/116", standard: true },
    CatalogEntry { variant: "tshirt-116", bucket_type: "tshirts", size: "110/116", standard: true },
    CatalogEntry { variant: "tshirt-122", bucket_type: "tshirts", size: "122/128", standard: true },
    CatalogEntry { variant: "tshirt-128", bucket_type: "tshirts", size: "122/128", standard: true },
    CatalogEntry { variant: "tshirt-s", bucket_type: "tshirts", size: "S", standard: true },
    CatalogEntry { variant: "tshirt-m", bucket_type: "tshirts", size: "M", standard: true },
    CatalogEntry { variant: "tshirt-l", bucket_type: "tshirts", size: "L", standard: true },
    CatalogEntry { variant: "tshirt-xl", bucket_type: "tshirts", size: "XL", standard: true },
    // --- standard hoodies (single sizes) ---
    CatalogEntry { variant: "hoodie-104", bucket_type: "hoodies", size: "104", standard: true },
    CatalogEntry { variant: "hoodie-116", bucket_type: "hoodies", size: "116", standard: true },
    CatalogEntry { variant: "hoodie-128", bucket_type: "hoodies", size: "128", standard: true },
    CatalogEntry { variant: "hoodie-140", bucket_type: "hoodies", size: "140", standard: true },
    CatalogEntry { variant: "hoodie-s", bucket_type: "hoodies", size: "S", standard: true },
    CatalogEntry { variant: "hoodie-m", bucket_type: "hoodies", size: "M", standard: true },
    CatalogEntry { variant: "hoodie-l", bucket_type: "hoodies", size: "L", standard: true },
    // --- standard caps (one size) ---
    CatalogEntry { variant: "cap-one-size", bucket_type: "caps", size: "one-size", standard: true },
    // --- personalized (event-specific prints, ordered per event) ---
    CatalogEntry { variant: "class-tshirt-98", bucket_type: "class_tshirts", size: "98/104", standard: false },
    CatalogEntry { variant: "class-tshirt-104", bucket_type: "class_tshirts", size: "98/104", standard: false },
    CatalogEntry { variant: "class-tshirt-110", bucket_type: "class_tshirts", size: "110/116", standard: false },
    CatalogEntry { variant: "class-tshirt-116", bucket_type: "class_tshirts", size: "110/116", standard: false },
    CatalogEntry { variant: "class-tshirt-122", bucket_type: "class_tshirts", size: "122/128", standard: false },
    CatalogEntry { variant: "class-tshirt-128", bucket_type: "class_tshirts", size: "122/128", standard: false },
    CatalogEntry { variant: "class-hoodie-128", bucket_type: "class_hoodies", size: "128", standard: false },
    CatalogEntry { variant: "class-hoodie-140", bucket_type: "class_hoodies", size: "140", standard: false },
    CatalogEntry { variant: "name-cap-one-size", bucket_type: "name_caps", size: "one-size", standard: false },
];

fn entry(variant: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.variant == variant)
}

/// Resolve any clothing variant to its bucket. Non-clothing SKUs resolve to None.
pub fn resolve(variant: &str) -> Option<ItemBucket> {
    entry(variant).map(|e| ItemBucket {
        bucket_type: e.bucket_type,
        size: e.size,
    })
}

/// Resolve only standard (non-personalized) clothing variants.
pub fn resolve_standard(variant: &str) -> Option<ItemBucket> {
    entry(variant).filter(|e| e.standard).map(|e| ItemBucket {
        bucket_type: e.bucket_type,
        size: e.size,
    })
}

/// Resolve only personalized clothing variants.
pub fn resolve_personalized(variant: &str) -> Option<ItemBucket> {
    entry(variant).filter(|e| !e.standard).map(|e| ItemBucket {
        bucket_type: e.bucket_type,
        size: e.size,
    })
}

/// Is the variant part of the standard (weekly batch) catalog?
pub fn is_standard(variant: &str) -> bool {
    entry(variant).is_some_and(|e| e.standard)
}

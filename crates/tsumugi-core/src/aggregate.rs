//! Aggregator - 注文集合からバケット別数量と売上合計への純関数
//!
//! # 設計原則
//! - **純粋・冪等**: 同じ注文集合に対しては常に同じ結果。Aggregator 自身は
//!   過去の実行を覚えない。バッチ済み注文の除外は呼び出し側の責務
//!   （タスク／GuesstimateOrder の order_ids に未リンクの注文だけを渡す）。
//! - 解決できない行アイテム（衣類以外など）は `aggregated_items` から
//!   静かに除外するが、その注文自体は totals / order_ids に数える。
//!   1 つの注文に衣類と非衣類が混ざるのは普通のこと。
//! - 売上は注文レベルの total を合算する。行アイテムから再計算すると
//!   送料・税を二重に数えるので、しない。
//! - 空の注文集合はゼロ集計であってエラーではない。「何もすることがない」
//!   かどうかの判断は呼び出し側が行う。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::ItemBucket;
use crate::domain::{ContainsLine, Order, OrderId};

/// Bucketed item counts and totals for a set of orders.
///
/// `aggregated_items[bucket_type][size] = quantity`.
/// BTreeMap なので走査順は決定的。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderAggregate {
    pub total_orders: u32,
    pub total_revenue: f64,
    pub aggregated_items: BTreeMap<String, BTreeMap<String, u32>>,
    pub order_ids: Vec<OrderId>,
}

impl OrderAggregate {
    /// ゼロ集計（空入力の正当な結果）。
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.total_orders == 0
    }

    /// Sum of quantities across all buckets.
    pub fn total_quantity(&self) -> u32 {
        self.aggregated_items
            .values()
            .flat_map(|sizes| sizes.values())
            .sum()
    }
}

/// Aggregate a set of orders.
///
/// `resolve` decides which line items land in a bucket (standard vs
/// personalized pipelines pass different resolvers).
pub fn aggregate<'a, I>(orders: I, resolve: impl Fn(&str) -> Option<ItemBucket>) -> OrderAggregate
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut agg = OrderAggregate::empty();

    for order in orders {
        agg.total_orders += 1;
        agg.total_revenue += order.total;
        agg.order_ids.push(order.id.clone());

        for item in &order.items {
            if let Some(bucket) = resolve(&item.variant) {
                *agg.aggregated_items
                    .entry(bucket.bucket_type.to_string())
                    .or_default()
                    .entry(bucket.size.to_string())
                    .or_default() += item.quantity;
            }
        }
    }

    agg
}

/// Aggregate resolvable line items per SKU, for a supplier order's `contains`.
///
/// 同じ SKU が複数注文に現れたら数量を合算する。順序は SKU で決定的。
pub fn aggregate_contains<'a, I>(
    orders: I,
    resolve: impl Fn(&str) -> Option<ItemBucket>,
) -> Vec<ContainsLine>
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut per_sku: BTreeMap<String, (String, u32)> = BTreeMap::new();

    for order in orders {
        for item in &order.items {
            if resolve(&item.variant).is_some() {
                let slot = per_sku
                    .entry(item.variant.clone())
                    .or_insert_with(|| (item.name.clone(), 0));
                slot.1 += item.quantity;
            }
        }
    }

    per_sku
        .into_iter()
        .map(|(sku, (name, quantity))| ContainsLine { sku, name, quantity })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::domain::LineItem;
    use chrono::NaiveDate;

    fn order(id: &str, total: f64, items: Vec<(&str, &str, u32)>) -> Order {
        Order {
            id: OrderId::new(id),
            event_id: None,
            event_name: None,
            purchased_at: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            total,
            items: items
                .into_iter()
                .map(|(variant, name, quantity)| LineItem {
                    variant: variant.to_string(),
                    name: name.to_string(),
                    quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn worked_example_two_orders() {
        let orders = vec![
            order("O1", 49.99, vec![("tshirt-98", "T-shirt 98", 1)]),
            order("O2", 25.00, vec![("hoodie-128", "Hoodie 128", 2)]),
        ];

        let agg = aggregate(&orders, catalog::resolve_standard);

        assert_eq!(agg.total_orders, 2);
        assert!((agg.total_revenue - 74.99).abs() < 1e-9);
        assert_eq!(agg.aggregated_items["tshirts"]["98/104"], 1);
        assert_eq!(agg.aggregated_items["hoodies"]["128"], 2);
        assert_eq!(
            agg.order_ids,
            vec![OrderId::new("O1"), OrderId::new("O2")]
        );
    }

    #[test]
    fn aggregation_is_idempotent() {
        let orders = vec![
            order("O1", 49.99, vec![("tshirt-98", "T-shirt 98", 1)]),
            order("O2", 25.00, vec![("hoodie-128", "Hoodie 128", 2)]),
        ];

        let first = aggregate(&orders, catalog::resolve_standard);
        let second = aggregate(&orders, catalog::resolve_standard);

        assert_eq!(first, second);
    }

    #[test]
    fn unresolvable_items_are_excluded_from_buckets_but_order_still_counts() {
        // 衣類とアルバムが混ざった注文
        let orders = vec![order(
            "O3",
            80.00,
            vec![
                ("tshirt-m", "T-shirt M", 1),
                ("photo-album-a4", "Photo album", 1),
            ],
        )];

        let agg = aggregate(&orders, catalog::resolve_standard);

        assert_eq!(agg.total_orders, 1);
        assert!((agg.total_revenue - 80.00).abs() < 1e-9);
        assert_eq!(agg.order_ids.len(), 1);
        // アルバムはバケットに現れない
        assert_eq!(agg.total_quantity(), 1);
    }

    #[test]
    fn quantity_conservation_over_resolvable_items() {
        let orders = vec![
            order(
                "O1",
                10.0,
                vec![("tshirt-98", "T", 2), ("hoodie-140", "H", 3)],
            ),
            order(
                "O2",
                10.0,
                vec![("tshirt-104", "T", 1), ("cd-event-recording", "CD", 4)],
            ),
        ];

        let resolvable_quantity: u32 = orders
            .iter()
            .flat_map(|o| &o.items)
            .filter(|i| catalog::resolve_standard(&i.variant).is_some())
            .map(|i| i.quantity)
            .sum();

        let agg = aggregate(&orders, catalog::resolve_standard);
        assert_eq!(agg.total_quantity(), resolvable_quantity);
        assert_eq!(agg.total_quantity(), 6);
        // 型番ペア（98 と 104）は同じバケットに足し込まれる
        assert_eq!(agg.aggregated_items["tshirts"]["98/104"], 3);
    }

    #[test]
    fn empty_input_is_a_zero_aggregate_not_an_error() {
        let agg = aggregate(std::iter::empty(), catalog::resolve_standard);
        assert!(agg.is_empty());
        assert_eq!(agg.total_orders, 0);
        assert_eq!(agg.total_revenue, 0.0);
        assert!(agg.aggregated_items.is_empty());
        assert!(agg.order_ids.is_empty());
    }

    #[test]
    fn contains_sums_quantities_per_sku() {
        let orders = vec![
            order("O1", 10.0, vec![("tshirt-98", "T-shirt 98", 1)]),
            order(
                "O2",
                10.0,
                vec![("tshirt-98", "T-shirt 98", 2), ("photo-album-a4", "Album", 1)],
            ),
        ];

        let contains = aggregate_contains(&orders, catalog::resolve_standard);

        assert_eq!(contains.len(), 1);
        assert_eq!(contains[0].sku, "tshirt-98");
        assert_eq!(contains[0].quantity, 3);
    }
}

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::core::Offer;
use crate::query::request::SortOrder;

/// 超过该规模时改用 rayon 并行排序
const PAR_SORT_THRESHOLD: usize = 16 * 1024;

/// 全序比较：价格（按 order），同价按 id 升序。
///
/// UUID 规范字符串（小写十六进制 + 固定位置连字符）的字典序与其 16 字节大端序一致，
/// 所以直接比较 `Uuid` 即可。
#[inline]
pub fn compare_offers(order: SortOrder, a: &Offer, b: &Offer) -> Ordering {
    let by_price = match order {
        SortOrder::PriceAsc => a.price.cmp(&b.price),
        SortOrder::PriceDesc => b.price.cmp(&a.price),
    };
    by_price.then_with(|| a.id.cmp(&b.id))
}

/// 页边界：[page*size, page*size+size) 截断到 [0, len]
pub fn page_bounds(len: usize, page: u64, page_size: u64) -> (usize, usize) {
    let start = page.saturating_mul(page_size);
    let end = start.saturating_add(page_size);
    let clamp = |v: u64| usize::try_from(v).map_or(len, |v| v.min(len));
    (clamp(start), clamp(end))
}

/// 排序 + 切页。只需要前 end 条时先 select_nth 分区，再对前缀排序（top-k）。
pub fn paginate<'a>(
    mut offers: Vec<&'a Offer>,
    order: SortOrder,
    page: u64,
    page_size: u64,
) -> Vec<&'a Offer> {
    let (start, end) = page_bounds(offers.len(), page, page_size);
    if start >= end {
        return Vec::new();
    }

    let cmp = |a: &&Offer, b: &&Offer| compare_offers(order, a, b);
    if end < offers.len() {
        offers.select_nth_unstable_by(end, cmp);
        offers.truncate(end);
    }
    if offers.len() >= PAR_SORT_THRESHOLD {
        offers.par_sort_unstable_by(cmp);
    } else {
        offers.sort_unstable_by(cmp);
    }

    offers.drain(start..end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::{uid, OfferSpec};

    fn five() -> Vec<Offer> {
        [(1, 300), (2, 100), (3, 200), (4, 100), (5, 500)]
            .into_iter()
            .map(|(id, price)| OfferSpec { id, price, ..Default::default() }.build())
            .collect()
    }

    fn ids(page: &[&Offer]) -> Vec<u128> {
        page.iter().map(|o| o.id.as_u128()).collect()
    }

    #[test]
    fn first_page_is_head_of_sort_order() {
        let offers = five();
        let page = paginate(offers.iter().collect(), SortOrder::PriceAsc, 0, 2);
        assert_eq!(ids(&page), vec![2, 4]);
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let offers = five();
        assert!(paginate(offers.iter().collect(), SortOrder::PriceAsc, 10, 2).is_empty());
    }

    #[test]
    fn last_partial_page_is_clamped() {
        let offers = five();
        let page = paginate(offers.iter().collect(), SortOrder::PriceAsc, 2, 2);
        assert_eq!(ids(&page), vec![5]);
    }

    #[test]
    fn descending_keeps_id_ascending_tie_break() {
        let offers = five();
        let page = paginate(offers.iter().collect(), SortOrder::PriceDesc, 0, 5);
        assert_eq!(ids(&page), vec![5, 1, 3, 2, 4]);
    }

    #[test]
    fn pages_partition_the_full_order() {
        let offers = five();
        let full = paginate(offers.iter().collect(), SortOrder::PriceAsc, 0, 100);
        let mut stitched = Vec::new();
        for p in 0..3 {
            stitched.extend(paginate(offers.iter().collect(), SortOrder::PriceAsc, p, 2));
        }
        assert_eq!(ids(&full), ids(&stitched));
    }

    #[test]
    fn id_order_matches_canonical_string_order() {
        let a = uid(0x0a00_0000_0000_0000_0000_0000_0000_0000);
        let b = uid(0x9f00_0000_0000_0000_0000_0000_0000_0000);
        assert_eq!(a.cmp(&b), a.to_string().cmp(&b.to_string()));
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        assert_eq!(page_bounds(5, u64::MAX, u64::MAX), (5, 5));
        assert_eq!(page_bounds(5, 0, 0), (0, 0));
    }
}

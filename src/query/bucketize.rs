use std::collections::BTreeMap;

use crate::core::{Result, SearchError};
use crate::query::response::HistogramRange;

/// 定宽直方图累加器：按 floor(v / width) 分桶，只输出非空桶，按 start 升序
#[derive(Clone, Debug)]
pub struct Bucketizer {
    width: u64,
    counts: BTreeMap<u64, u64>,
}

impl Bucketizer {
    pub fn new(width: u64) -> Result<Self> {
        if width == 0 {
            return Err(SearchError::invalid("histogram bucket width must be > 0"));
        }
        Ok(Self {
            width,
            counts: BTreeMap::new(),
        })
    }

    #[inline]
    pub fn add(&mut self, value: u64) {
        let start = (value / self.width) * self.width;
        *self.counts.entry(start).or_insert(0) += 1;
    }

    pub fn finish(self) -> Vec<HistogramRange> {
        let width = self.width;
        self.counts
            .into_iter()
            .map(|(start, count)| HistogramRange {
                start,
                end: start.saturating_add(width),
                count,
            })
            .collect()
    }
}

pub fn bucketize<I>(values: I, width: u64) -> Result<Vec<HistogramRange>>
where
    I: IntoIterator<Item = u64>,
{
    let mut b = Bucketizer::new(width)?;
    for v in values {
        b.add(v);
    }
    Ok(b.finish())
}

/// 可增长位向量：u64 字存储，按字做 AND / OR / NOT。
///
/// 不变量：`len` 之后的位恒为 0（NOT 之后也会清尾）。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitVec {
    words: Vec<u64>,
    len: usize,
}

const WORD_BITS: usize = 64;

#[inline]
fn words_for(bits: usize) -> usize {
    bits.div_ceil(WORD_BITS)
}

impl BitVec {
    pub fn new() -> Self {
        Self::default()
    }

    /// 长度为 len 的全 0 向量
    pub fn zeros(len: usize) -> Self {
        Self {
            words: vec![0; words_for(len)],
            len,
        }
    }

    /// 长度为 len 的全 1 向量
    pub fn ones(len: usize) -> Self {
        let mut v = Self {
            words: vec![u64::MAX; words_for(len)],
            len,
        };
        v.clear_tail();
        v
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// 扩容（新位为 0）或截断到 len
    pub fn resize(&mut self, len: usize) {
        self.words.resize(words_for(len), 0);
        self.len = len;
        self.clear_tail();
    }

    pub fn push(&mut self, value: bool) {
        let idx = self.len;
        self.resize(idx + 1);
        if value {
            self.words[idx / WORD_BITS] |= 1 << (idx % WORD_BITS);
        }
    }

    /// 设置第 idx 位；越界时自动扩容到 idx + 1
    pub fn set(&mut self, idx: usize, value: bool) {
        if idx >= self.len {
            self.resize(idx + 1);
        }
        let mask = 1u64 << (idx % WORD_BITS);
        if value {
            self.words[idx / WORD_BITS] |= mask;
        } else {
            self.words[idx / WORD_BITS] &= !mask;
        }
    }

    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        if idx >= self.len {
            return false;
        }
        self.words[idx / WORD_BITS] & (1 << (idx % WORD_BITS)) != 0
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// 交集；较短一方按 0 补齐，结果长度取较长者
    pub fn and(&self, other: &BitVec) -> BitVec {
        let mut out = self.clone();
        out.and_assign(other);
        out
    }

    pub fn and_assign(&mut self, other: &BitVec) {
        let len = self.len.max(other.len);
        self.resize(len);
        for (i, w) in self.words.iter_mut().enumerate() {
            *w &= other.words.get(i).copied().unwrap_or(0);
        }
    }

    /// 并集；结果长度取较长者
    pub fn or(&self, other: &BitVec) -> BitVec {
        let mut out = self.clone();
        out.or_assign(other);
        out
    }

    pub fn or_assign(&mut self, other: &BitVec) {
        let len = self.len.max(other.len);
        self.resize(len);
        for (w, o) in self.words.iter_mut().zip(other.words.iter()) {
            *w |= *o;
        }
    }

    /// 补集（仅在 [0, len) 内）
    pub fn not(&self) -> BitVec {
        let mut out = Self {
            words: self.words.iter().map(|w| !w).collect(),
            len: self.len,
        };
        out.clear_tail();
        out
    }

    /// 按升序枚举置位下标
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| {
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let bit = w.trailing_zeros() as usize;
                w &= w - 1;
                Some(wi * WORD_BITS + bit)
            })
        })
    }

    fn clear_tail(&mut self) {
        let rem = self.len % WORD_BITS;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }
}

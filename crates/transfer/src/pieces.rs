/// One bit per piece index with an O(1) received count.
///
/// Missing indices are derived on demand rather than tracked separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceSet {
    words: Vec<u64>,
    len: u32,
    count: u32,
}

impl PieceSet {
    /// Creates an all-clear set covering `len` pieces.
    pub fn new(len: u32) -> Self {
        Self {
            words: vec![0; (len as usize).div_ceil(64)],
            len,
            count: 0,
        }
    }

    /// Number of piece indices covered.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns `true` if the set covers no pieces.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of pieces marked received.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Returns `true` once every piece is marked.
    pub fn is_complete(&self) -> bool {
        self.count == self.len
    }

    /// Returns `true` if `index` is marked. Out-of-range indices are never marked.
    pub fn contains(&self, index: u32) -> bool {
        if index >= self.len {
            return false;
        }
        let (word, bit) = locate(index);
        self.words[word] & bit != 0
    }

    /// Marks `index`. Returns `false` if it was already marked or is out of range.
    pub fn insert(&mut self, index: u32) -> bool {
        if index >= self.len {
            return false;
        }
        let (word, bit) = locate(index);
        if self.words[word] & bit != 0 {
            return false;
        }
        self.words[word] |= bit;
        self.count += 1;
        true
    }

    /// Clears every mark.
    pub fn clear(&mut self) {
        self.words.fill(0);
        self.count = 0;
    }

    /// Iterates unmarked indices in ascending order.
    pub fn missing(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len).filter(|&i| !self.contains(i))
    }
}

fn locate(index: u32) -> (usize, u64) {
    ((index / 64) as usize, 1u64 << (index % 64))
}

/// Bounded stack of reusable objects.
///
/// `free` keeps at most `max` objects; extra ones are dropped. `peak`
/// records the largest number of free objects held so far.
#[derive(Debug)]
pub struct Pool<T> {
    free: Vec<T>,
    max: usize,
    peak: usize,
}

impl<T> Pool<T> {
    pub fn new(max: usize) -> Self {
        Self {
            free: Vec::new(),
            max,
            peak: 0,
        }
    }

    pub fn obtain(&mut self) -> Option<T> {
        self.free.pop()
    }

    /// Returns `false` if the pool was full and `object` was dropped.
    pub fn free(&mut self, object: T) -> bool {
        if self.free.len() >= self.max {
            return false;
        }
        self.free.push(object);
        self.peak = self.peak.max(self.free.len());
        true
    }

    pub fn clear(&mut self) {
        self.free.clear();
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn peak(&self) -> usize {
        self.peak
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new(usize::MAX)
    }
}

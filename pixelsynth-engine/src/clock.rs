//! Sample clock: turns a monotonically increasing sample counter into a
//! column position and the time within that column.

/// Position of one output sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tick {
    /// `floor(counter / samplesPerColumn) mod width`
    pub column: usize,
    /// `counter mod samplesPerColumn`
    pub index_in_column: u64,
    /// `index_in_column / sampleRate`, seconds. Kept in f64: columns can be long.
    pub time: f64,
    /// First sample of a column transition; a notification is due.
    pub entered: bool,
}

/// Playback position. Reset only by a full config replacement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Clock {
    counter: u64,
    last_column: i64,
}

impl Default for Clock {
    fn default() -> Self { Self::new() }
}

impl Clock {
    pub const fn new() -> Self {
        Self { counter: 0, last_column: -1 }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[inline] pub fn sample_counter(&self) -> u64 { self.counter }

    /// Last column a notification was raised for, or -1.
    #[inline] pub fn last_column(&self) -> i64 { self.last_column }

    /// Position of the current sample, then advance the counter by one.
    ///
    /// The counter advances even when nothing can be positioned (`width == 0`),
    /// in which case `None` is returned.
    #[inline]
    pub fn step(&mut self, samples_per_column: u64, width: usize, sample_rate: f32) -> Option<Tick> {
        let counter = self.counter;
        self.counter = self.counter.wrapping_add(1);
        if width == 0 {
            return None;
        }
        let spc = samples_per_column.max(1);
        #[allow(clippy::cast_possible_truncation)]
        let column = ((counter / spc) % width as u64) as usize;
        let index_in_column = counter % spc;
        #[allow(clippy::cast_precision_loss)]
        let time = index_in_column as f64 / f64::from(sample_rate);

        #[allow(clippy::cast_possible_wrap)]
        let col = column as i64;
        let entered = col != self.last_column;
        if entered {
            self.last_column = col;
        }
        Some(Tick { column, index_in_column, time, entered })
    }
}

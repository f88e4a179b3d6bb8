/// The delay and sound countdown timers. Both count down once per completed
/// cycle and stop at zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    /// (delay, sound)
    pub fn snapshot(&self) -> (u8, u8) {
        (self.delay, self.sound)
    }
}

//! Payload carried through the demo pipeline

use core::fmt;

use bitfield::bitfield;

bitfield! {
    #[derive(Copy, Clone, PartialEq, Eq)]
    // No more than 32 bits
    pub struct FrameHeader(u32);
    impl Debug;
    u32;
    pub seq, set_seq: 23, 0;
    pub stage, set_stage: 27, 24;
}

/// Sequence numbers wrap at 2^24
pub const SEQ_MASK: u32 = (1 << 24) - 1;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input = 0,
    Working = 1,
    Output = 2,
}

impl Stage {
    pub fn from_bits(bits: u32) -> Option<Stage> {
        match bits {
            0 => Some(Stage::Input),
            1 => Some(Stage::Working),
            2 => Some(Stage::Output),
            _ => None,
        }
    }

    fn next(self) -> Stage {
        match self {
            Stage::Input => Stage::Working,
            Stage::Working | Stage::Output => Stage::Output,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub value: i64,
}

impl Frame {
    pub fn new(seq: u32, value: i64) -> Self {
        let mut header = FrameHeader(0);
        header.set_seq(seq & SEQ_MASK);
        header.set_stage(Stage::Input as u32);
        Frame { header, value }
    }

    #[inline]
    pub fn seq(&self) -> u32 {
        self.header.seq()
    }

    #[inline]
    pub fn stage(&self) -> Option<Stage> {
        Stage::from_bits(self.header.stage())
    }

    /// Same sequence number, next stage tag, new payload
    pub fn advance(mut self, value: i64) -> Self {
        let next = self.stage().unwrap_or(Stage::Output).next();
        self.header.set_stage(next as u32);
        self.value = value;
        self
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

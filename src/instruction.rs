//! Decoding of 16-bit instruction words.
//!
//! Operand fields, named as in the usual CHIP-8 tables:
//!  * `X`   bits 8-11, a register index
//!  * `Y`   bits 4-7, a register index
//!  * `N`   bits 0-3
//!  * `NN`  bits 0-7
//!  * `NNN` bits 0-11, an address

/// One decoded instruction. `x` and `y` are register indices (0-F).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1NNN
    Jump(u16),
    /// 2NNN
    Call(u16),
    /// 3XNN
    SkipIfEqConst { x: usize, nn: u8 },
    /// 4XNN
    SkipIfNeConst { x: usize, nn: u8 },
    /// 5XY0
    SkipIfEqReg { x: usize, y: usize },
    /// 6XNN
    SetConst { x: usize, nn: u8 },
    /// 7XNN
    AddConst { x: usize, nn: u8 },
    /// 8XY0
    Assign { x: usize, y: usize },
    /// 8XY1
    Or { x: usize, y: usize },
    /// 8XY2
    And { x: usize, y: usize },
    /// 8XY3
    Xor { x: usize, y: usize },
    /// 8XY4
    AddReg { x: usize, y: usize },
    /// 8XY5
    SubReg { x: usize, y: usize },
    /// 8XY6
    ShiftRight { x: usize },
    /// 8XY7
    SubFromReg { x: usize, y: usize },
    /// 8XYE
    ShiftLeft { x: usize },
    /// 9XY0
    SkipIfNeReg { x: usize, y: usize },
    /// ANNN
    SetIndex(u16),
    /// BNNN
    JumpOffset(u16),
    /// CXNN
    Random { x: usize, nn: u8 },
    /// DXYN
    Draw { x: usize, y: usize, n: u8 },
    /// EX9E
    SkipIfKey { x: usize },
    /// EXA1
    SkipIfNotKey { x: usize },
    /// FX07
    GetDelay { x: usize },
    /// FX0A
    WaitKey { x: usize },
    /// FX15
    SetDelay { x: usize },
    /// FX18
    SetSound { x: usize },
    /// FX1E
    AddIndex { x: usize },
    /// FX29
    GlyphAddress { x: usize },
    /// FX33
    StoreBcd { x: usize },
    /// FX55
    StoreRegisters { x: usize },
    /// FX65
    LoadRegisters { x: usize },
}

impl Instruction {
    /// Decode a word, or `None` if it matches no known pattern.
    pub fn decode(word: u16) -> Option<Instruction> {
        use Instruction::*;

        let x = ((word & 0x0f00) >> 8) as usize;
        let y = ((word & 0x00f0) >> 4) as usize;
        let n = (word & 0x000f) as u8;
        let nn = (word & 0x00ff) as u8;
        let nnn = word & 0x0fff;

        let instruction = match word >> 12 {
            0x0 => match word {
                0x00e0 => ClearScreen,
                0x00ee => Return,
                _ => return None,
            },
            0x1 => Jump(nnn),
            0x2 => Call(nnn),
            0x3 => SkipIfEqConst { x, nn },
            0x4 => SkipIfNeConst { x, nn },
            0x5 if n == 0 => SkipIfEqReg { x, y },
            0x6 => SetConst { x, nn },
            0x7 => AddConst { x, nn },
            0x8 => match n {
                0x0 => Assign { x, y },
                0x1 => Or { x, y },
                0x2 => And { x, y },
                0x3 => Xor { x, y },
                0x4 => AddReg { x, y },
                0x5 => SubReg { x, y },
                0x6 => ShiftRight { x },
                0x7 => SubFromReg { x, y },
                0xe => ShiftLeft { x },
                _ => return None,
            },
            0x9 if n == 0 => SkipIfNeReg { x, y },
            0xa => SetIndex(nnn),
            0xb => JumpOffset(nnn),
            0xc => Random { x, nn },
            0xd => Draw { x, y, n },
            0xe => match nn {
                0x9e => SkipIfKey { x },
                0xa1 => SkipIfNotKey { x },
                _ => return None,
            },
            0xf => match nn {
                0x07 => GetDelay { x },
                0x0a => WaitKey { x },
                0x15 => SetDelay { x },
                0x18 => SetSound { x },
                0x1e => AddIndex { x },
                0x29 => GlyphAddress { x },
                0x33 => StoreBcd { x },
                0x55 => StoreRegisters { x },
                0x65 => LoadRegisters { x },
                _ => return None,
            },
            _ => return None,
        };
        Some(instruction)
    }
}

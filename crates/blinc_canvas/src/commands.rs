//! Path command buffer
//!
//! Commands are stored as a typed opcode stream plus a flat operand array. Points are
//! transformed into output space when appended, so the buffer always holds final
//! coordinates regardless of later transform changes.

use blinc_core::{Vec2, Winding};

use crate::transform::TransformStack;

/// Opcode tag of a stored command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    MoveTo = 0,
    LineTo = 1,
    BezierTo = 2,
    Close = 3,
    Winding = 4,
}

impl Opcode {
    /// Number of float operands following the opcode
    pub const fn arity(self) -> usize {
        match self {
            Opcode::MoveTo | Opcode::LineTo => 2,
            Opcode::BezierTo => 6,
            Opcode::Close => 0,
            Opcode::Winding => 1,
        }
    }
}

/// Decoded path command
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    MoveTo(Vec2),
    LineTo(Vec2),
    /// Control point 1, control point 2, end point
    BezierTo(Vec2, Vec2, Vec2),
    Close,
    Winding(Winding),
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::MoveTo(_) => Opcode::MoveTo,
            Command::LineTo(_) => Opcode::LineTo,
            Command::BezierTo(..) => Opcode::BezierTo,
            Command::Close => Opcode::Close,
            Command::Winding(_) => Opcode::Winding,
        }
    }

    /// Last point the command moves the pen to
    pub fn end_point(&self) -> Option<Vec2> {
        match *self {
            Command::MoveTo(p) | Command::LineTo(p) | Command::BezierTo(_, _, p) => Some(p),
            Command::Close | Command::Winding(_) => None,
        }
    }

    fn map_points(self, f: impl Fn(Vec2) -> Vec2) -> Self {
        match self {
            Command::MoveTo(p) => Command::MoveTo(f(p)),
            Command::LineTo(p) => Command::LineTo(f(p)),
            Command::BezierTo(c1, c2, p) => Command::BezierTo(f(c1), f(c2), f(p)),
            other => other,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandBuffer {
    opcodes: Vec<Opcode>,
    operands: Vec<f32>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.opcodes.clear();
        self.operands.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn opcodes(&self) -> &[Opcode] {
        &self.opcodes
    }

    pub fn operands(&self) -> &[f32] {
        &self.operands
    }

    /// Raw operand bytes, for exact stream comparisons
    pub fn operand_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.operands)
    }

    /// Appends a command, mapping its points through the current transform
    pub fn append(&mut self, command: Command, transform: &TransformStack) {
        self.push_raw(command.map_points(|p| transform.apply(p)));
    }

    /// Appends a command whose points are already in output space
    pub fn push_raw(&mut self, command: Command) {
        self.opcodes.push(command.opcode());
        match command {
            Command::MoveTo(p) | Command::LineTo(p) => self.operands.extend_from_slice(&[p.x, p.y]),
            Command::BezierTo(c1, c2, p) => {
                self.operands
                    .extend_from_slice(&[c1.x, c1.y, c2.x, c2.y, p.x, p.y]);
            }
            Command::Close => {}
            Command::Winding(w) => self.operands.push(w.tag()),
        }
    }

    pub fn iter(&self) -> CommandReader<'_> {
        CommandReader {
            opcodes: &self.opcodes,
            operands: &self.operands,
            op: 0,
            cursor: 0,
        }
    }
}

impl<'a> IntoIterator for &'a CommandBuffer {
    type Item = Command;
    type IntoIter = CommandReader<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Cursor over a [`CommandBuffer`]
///
/// Every step is bounds-checked against the opcode arity; a truncated record ends the
/// iteration instead of reading past the operand array.
#[derive(Clone, Debug)]
pub struct CommandReader<'a> {
    opcodes: &'a [Opcode],
    operands: &'a [f32],
    op: usize,
    cursor: usize,
}

impl<'a> Iterator for CommandReader<'a> {
    type Item = Command;

    fn next(&mut self) -> Option<Command> {
        let opcode = *self.opcodes.get(self.op)?;
        let end = self.cursor + opcode.arity();
        let Some(args) = self.operands.get(self.cursor..end) else {
            tracing::warn!(
                "truncated {:?} record at operand {}, stopping command read",
                opcode,
                self.cursor
            );
            self.op = self.opcodes.len();
            return None;
        };
        self.op += 1;
        self.cursor = end;

        let pt = |i: usize| Vec2::new(args[i], args[i + 1]);
        Some(match opcode {
            Opcode::MoveTo => Command::MoveTo(pt(0)),
            Opcode::LineTo => Command::LineTo(pt(0)),
            Opcode::BezierTo => Command::BezierTo(pt(0), pt(2), pt(4)),
            Opcode::Close => Command::Close,
            Opcode::Winding => Command::Winding(Winding::from_tag(args[0])),
        })
    }
}

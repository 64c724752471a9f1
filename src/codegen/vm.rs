//! Typed model of the target stack machine's instruction set and its
//! textual rendering, one instruction per line.

// region: VmProgram

#[derive(Debug)]
pub struct VmProgram {
    blocks: Vec<VmInstructionBlock>,
}

impl VmProgram {
    pub const fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub fn add_block(&mut self, block: VmInstructionBlock) {
        self.blocks.push(block);
    }

    pub fn compile(self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for VmProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // every instruction line carries a trailing newline
        for block in &self.blocks {
            writeln!(f, "{block}")?;
        }
        Ok(())
    }
}

// endregion

// region: VmInstructionBlock

#[derive(Debug)]
pub struct VmInstructionBlock {
    instructions: Vec<VmInstruction>,
}

impl std::fmt::Display for VmInstructionBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.instructions
                .iter()
                .map(|instruction| format!("{instruction}"))
                .collect::<Vec<_>>()
                .join("\n")
        )
    }
}

impl From<Vec<VmInstruction>> for VmInstructionBlock {
    fn from(instructions: Vec<VmInstruction>) -> Self {
        Self { instructions }
    }
}

impl VmInstructionBlock {
    pub fn compile(self) -> String {
        self.to_string()
    }
}

// endregion

// region: VmInstruction

// region: VmInstruction utility functions

/// Utility function for the `PUSHI` VM instruction.
pub fn pushi(value: i64) -> VmInstruction {
    VmInstruction::PushInt(value)
}

/// Utility function for the `PUSHS` VM instruction.
pub fn pushs<S: Into<String>>(text: S) -> VmInstruction {
    VmInstruction::PushString(text.into())
}

/// Utility function for the `PUSHG` VM instruction.
pub fn pushg(slot: usize) -> VmInstruction {
    VmInstruction::PushGlobal(slot)
}

/// Utility function for the `PUSHL` VM instruction.
pub fn pushl(slot: usize) -> VmInstruction {
    VmInstruction::PushLocal(slot)
}

/// Utility function for the `STOREL` VM instruction.
pub fn storel(slot: usize) -> VmInstruction {
    VmInstruction::StoreLocal(slot)
}

/// Utility function for the `STOREG` VM instruction.
pub fn storeg(slot: usize) -> VmInstruction {
    VmInstruction::StoreGlobal(slot)
}

/// Utility function for the `PUSHN` VM instruction.
pub fn pushn(count: usize) -> VmInstruction {
    VmInstruction::PushN(count)
}

/// Utility function for the `POPN` VM instruction.
pub fn popn(count: usize) -> VmInstruction {
    VmInstruction::PopN(count)
}

/// Utility function for the `DUPN` VM instruction.
pub fn dupn(count: usize) -> VmInstruction {
    VmInstruction::DupN(count)
}

/// Utility function for the `LOAD` VM instruction.
pub fn load(slot: usize) -> VmInstruction {
    VmInstruction::Load(slot)
}

/// Utility function for the `STORE` VM instruction.
pub fn store(slot: usize) -> VmInstruction {
    VmInstruction::Store(slot)
}

/// Utility function for the `ALLOC` VM instruction.
pub fn alloc(cells: usize) -> VmInstruction {
    VmInstruction::Alloc(cells)
}

/// Utility function for the `PUSHA` VM instruction.
pub fn pusha<S: Into<String>>(label: S) -> VmInstruction {
    VmInstruction::PushAddress(label.into())
}

/// Utility function for the `JUMP` VM instruction.
pub fn jump<S: Into<String>>(label: S) -> VmInstruction {
    VmInstruction::Jump(label.into())
}

/// Utility function for the `JZ` VM instruction.
pub fn jz<S: Into<String>>(label: S) -> VmInstruction {
    VmInstruction::JumpZero(label.into())
}

/// Utility function for zero-operand VM instructions.
pub fn command(command: VmCommand) -> VmInstruction {
    VmInstruction::Command(command)
}

/// Utility function for the `CALL` VM instruction.
pub fn vm_call() -> VmInstruction {
    VmInstruction::Command(VmCommand::Call)
}

/// Utility function for the `RETURN` VM instruction.
pub fn vm_return() -> VmInstruction {
    VmInstruction::Command(VmCommand::Return)
}

/// Utility function for a label definition.
pub fn label<S: Into<String>>(name: S) -> VmInstruction {
    VmInstruction::Label(name.into())
}

/// Utility function for a `--` comment line.
pub fn comment<S: Into<String>>(text: S) -> VmInstruction {
    VmInstruction::Comment(text.into())
}

// endregion

type Label = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmInstruction {
    PushInt(i64),
    PushString(String),
    PushGlobal(usize),
    PushLocal(usize),
    PushStackPointer,
    PushFramePointer(i64),
    StoreLocal(usize),
    StoreGlobal(usize),
    PushN(usize),
    PopN(usize),
    DupN(usize),
    Load(usize),
    Store(usize),
    Alloc(usize),
    PushAddress(Label),
    Jump(Label),
    JumpZero(Label),
    Command(VmCommand),
    Abort(String),
    Label(Label),
    Comment(String),
}

impl VmInstruction {
    fn as_instruction(&self) -> String {
        match self {
            Self::PushInt(value) => format!("PUSHI {value}"),
            Self::PushString(text) => format!("PUSHS \"{}\"", escape(text)),
            Self::PushGlobal(slot) => format!("PUSHG {slot}"),
            Self::PushLocal(slot) => format!("PUSHL {slot}"),
            Self::PushStackPointer => "PUSHSP".to_string(),
            Self::PushFramePointer(offset) => format!("PUSHFP {offset}"),
            Self::StoreLocal(slot) => format!("STOREL {slot}"),
            Self::StoreGlobal(slot) => format!("STOREG {slot}"),
            Self::PushN(count) => format!("PUSHN {count}"),
            Self::PopN(count) => format!("POPN {count}"),
            Self::DupN(count) => format!("DUPN {count}"),
            Self::Load(slot) => format!("LOAD {slot}"),
            Self::Store(slot) => format!("STORE {slot}"),
            Self::Alloc(cells) => format!("ALLOC {cells}"),
            Self::PushAddress(target) => format!("PUSHA {target}"),
            Self::Jump(target) => format!("JUMP {target}"),
            Self::JumpZero(target) => format!("JZ {target}"),
            Self::Command(command) => command.to_string(),
            Self::Abort(message) => format!("ERR \"{}\"", escape(message)),
            Self::Label(name) => format!("{name}: NOP"),
            Self::Comment(text) => format!("-- {text}"),
        }
    }
}

impl std::fmt::Display for VmInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_instruction())
    }
}

#[derive(Debug, strum::Display, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "UPPERCASE")]
pub enum VmCommand {
    Nop,
    Start,
    Stop,
    Swap,
    Equal,
    Not,
    Inf,
    Infeq,
    Sup,
    Supeq,
    Add,
    Sub,
    Mul,
    Div,
    Concat,
    Str,
    Writei,
    Writes,
    Call,
    Return,
}

fn escape(text: &str) -> String {
    text.chars()
        .flat_map(|c| match c {
            '\\' => vec!['\\', '\\'],
            '"' => vec!['\\', '"'],
            '\n' => vec!['\\', 'n'],
            '\t' => vec!['\\', 't'],
            other => vec![other],
        })
        .collect()
}

// endregion

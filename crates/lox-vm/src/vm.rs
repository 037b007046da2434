//! Boucle fetch-decode-execute.

use std::io::{self, Write};

use lox_core::{disasm::disassemble_instruction, Chunk, Compiler, OpCode, Value};
use tracing::{debug, trace, warn};

use crate::{
    capture::Captured,
    config::VmConfig,
    error::{InterpretError, RuntimeError, RuntimeErrorKind},
    stack::Stack,
};

/// Phase courante de la VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VmState {
    /// Construite ou entre deux exécutions.
    #[default]
    Idle,
    /// Dans la boucle de dispatch.
    Running,
}

/// Machine virtuelle à pile.
///
/// Le chunk n'est jamais possédé : [`Vm::interpret`] le construit et le lâche,
/// [`Vm::run`] l'emprunte. Chaque VM a sa propre pile.
pub struct Vm<C> {
    compiler: C,
    config: VmConfig,
    stack: Stack,
    state: VmState,
    stdout: Box<dyn Write + Send>,
    trace_out: Box<dyn Write + Send>,
}

impl<C> Vm<C> {
    /// VM avec config par défaut, sortie sur stdout, trace sur stderr.
    pub fn new(compiler: C) -> Self {
        let config = VmConfig::default();
        Self {
            compiler,
            config,
            stack: Stack::new(config.stack_max),
            state: VmState::Idle,
            stdout: Box::new(io::stdout()),
            trace_out: Box::new(io::stderr()),
        }
    }

    /// Variante utile pour tests : sortie capturée.
    pub fn with_captured_stdout(compiler: C) -> (Self, Captured) {
        let cap = Captured::default();
        (Self::new(compiler).with_stdout(cap.clone()), cap)
    }

    /// Remplace la configuration (la pile est recréée à la nouvelle capacité).
    #[must_use]
    pub fn with_config(mut self, config: VmConfig) -> Self {
        self.stack = Stack::new(config.stack_max);
        self.config = config;
        self
    }

    /// Injecte le writer qui reçoit les valeurs retournées.
    #[must_use]
    pub fn with_stdout<W: Write + Send + 'static>(mut self, w: W) -> Self {
        self.stdout = Box::new(w);
        self
    }

    /// Injecte le writer de trace d'exécution.
    #[must_use]
    pub fn with_trace_output<W: Write + Send + 'static>(mut self, w: W) -> Self {
        self.trace_out = Box::new(w);
        self
    }

    /// Configuration courante.
    pub const fn config(&self) -> &VmConfig { &self.config }

    /// Phase courante.
    pub const fn state(&self) -> VmState { self.state }

    /// Contenu de la pile, du fond vers le sommet.
    pub fn stack(&self) -> &[Value] { self.stack.as_slice() }

    /// Vide la pile et revient à `Idle`.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.state = VmState::Idle;
    }

    /// Exécute `chunk` depuis son premier octet jusqu'à `OP_RETURN`.
    pub fn run(&mut self, chunk: &Chunk) -> Result<Value, RuntimeError> {
        self.reset();
        self.state = VmState::Running;
        let result = self.dispatch(chunk);
        if let Err(err) = &result {
            debug!(line = err.line, error = %err.kind, "runtime error");
            self.stack.clear();
        }
        self.state = VmState::Idle;
        result
    }

    /* ────────── Dispatch ────────── */

    fn dispatch(&mut self, chunk: &Chunk) -> Result<Value, RuntimeError> {
        let mut ip = 0usize;
        loop {
            if self.config.trace {
                self.trace_instruction(chunk, ip);
            }

            let offset = ip;
            let line = chunk.line_at(offset).unwrap_or_else(|| last_line(chunk));
            let fail = |kind| RuntimeError::new(kind, line);

            let byte = *chunk.code().get(ip).ok_or_else(|| fail(RuntimeErrorKind::UnexpectedEnd))?;
            ip += 1;
            let op = OpCode::try_from(byte).map_err(|b| fail(RuntimeErrorKind::UnknownOpcode(b)))?;
            trace!(offset, %op, depth = self.stack.len(), "dispatch");

            match op {
                OpCode::Constant | OpCode::ConstantLong => {
                    let idx = chunk
                        .read_operand(offset, op)
                        .ok()
                        .flatten()
                        .ok_or_else(|| fail(RuntimeErrorKind::UnexpectedEnd))?;
                    ip += op.operand_len();
                    let value = chunk.constant(idx).ok_or_else(|| fail(RuntimeErrorKind::ConstantOutOfRange(idx)))?;
                    self.stack.push(value).map_err(fail)?;
                }
                OpCode::Negate => {
                    let Value::Number(n) = self.stack.pop().map_err(fail)?;
                    self.stack.push(Value::Number(-n)).map_err(fail)?;
                }
                OpCode::Add => self.binary(|a, b| a + b).map_err(fail)?,
                OpCode::Subtract => self.binary(|a, b| a - b).map_err(fail)?,
                OpCode::Multiply => self.binary(|a, b| a * b).map_err(fail)?,
                OpCode::Divide => self.binary(|a, b| a / b).map_err(fail)?,
                OpCode::Return => {
                    let value = self.stack.pop().map_err(fail)?;
                    writeln!(self.stdout, "{value}")
                        .and_then(|()| self.stdout.flush())
                        .map_err(|e| fail(RuntimeErrorKind::Output(e.to_string())))?;
                    return Ok(value);
                }
            }
        }
    }

    /// Dépile `b` puis `a`, empile `a op b`.
    fn binary(&mut self, op: impl FnOnce(f64, f64) -> f64) -> Result<(), RuntimeErrorKind> {
        let Value::Number(b) = self.stack.pop()?;
        let Value::Number(a) = self.stack.pop()?;
        self.stack.push(Value::Number(op(a, b)))
    }

    /// La trace n'influe jamais sur l'exécution : un échec d'écriture la coupe.
    fn trace_instruction(&mut self, chunk: &Chunk, ip: usize) {
        let mut text = String::from("          ");
        for value in self.stack.as_slice() {
            text.push_str(&format!("[ {value} ]"));
        }
        text.push('\n');
        if ip < chunk.len() {
            disassemble_instruction(chunk, ip, &mut text);
        }
        if let Err(e) = self.trace_out.write_all(text.as_bytes()) {
            warn!(offset = ip, error = %e, "trace output failed, tracing disabled");
            self.config.trace = false;
        }
    }
}

impl<C: Compiler> Vm<C> {
    /// Compile `source` dans un chunk neuf puis l'exécute.
    ///
    /// Une erreur de compilation ne fait jamais entrer la VM en `Running`.
    pub fn interpret(&mut self, source: &str) -> Result<Value, InterpretError> {
        let mut chunk = Chunk::new();
        self.compiler.compile(source, &mut chunk)?;
        debug!(bytes = chunk.len(), constants = chunk.constants().len(), "compiled");
        Ok(self.run(&chunk)?)
    }
}

fn last_line(chunk: &Chunk) -> u32 { chunk.lines().as_slice().last().copied().unwrap_or_default() }

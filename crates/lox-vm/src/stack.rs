//! Pile d'opérandes bornée.

use lox_core::Value;

use crate::{config::STACK_MAX, error::RuntimeErrorKind};

/// Pile de valeurs, capacité fixée à la construction.
#[derive(Debug, Clone)]
pub struct Stack {
    values: Vec<Value>,
    max: usize,
}

impl Stack {
    /// Pile vide acceptant au plus `max` valeurs.
    ///
    /// La préallocation est plafonnée à [`STACK_MAX`] ; au-delà la pile grandit à la demande.
    pub fn new(max: usize) -> Self { Self { values: Vec::with_capacity(max.min(STACK_MAX)), max } }

    /// Empile ; échoue si la pile est pleine.
    pub fn push(&mut self, value: Value) -> Result<(), RuntimeErrorKind> {
        if self.values.len() >= self.max {
            return Err(RuntimeErrorKind::StackOverflow);
        }
        self.values.push(value);
        Ok(())
    }

    /// Dépile ; échoue si la pile est vide.
    pub fn pop(&mut self) -> Result<Value, RuntimeErrorKind> {
        self.values.pop().ok_or(RuntimeErrorKind::StackUnderflow)
    }

    /// Sommet sans dépiler.
    pub fn peek(&self) -> Option<Value> { self.values.last().copied() }

    /// Nombre de valeurs.
    pub fn len(&self) -> usize { self.values.len() }

    /// Vrai si vide.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Capacité maximale.
    pub const fn max(&self) -> usize { self.max }

    /// Valeurs, du fond vers le sommet.
    pub fn as_slice(&self) -> &[Value] { &self.values }

    /// Ramène le sommet au fond.
    pub fn clear(&mut self) { self.values.clear(); }
}

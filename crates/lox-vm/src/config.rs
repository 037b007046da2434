//! Réglages de la VM.

/// Capacité par défaut de la pile d'opérandes.
pub const STACK_MAX: usize = 256;

/// Configuration d'une [`crate::Vm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Nombre maximal de valeurs sur la pile avant `StackOverflow`.
    pub stack_max: usize,
    /// Écrire la pile et l'instruction courante avant chaque instruction.
    pub trace: bool,
}

impl Default for VmConfig {
    fn default() -> Self { Self { stack_max: STACK_MAX, trace: false } }
}

impl VmConfig {
    /// Fixe la capacité de pile.
    #[must_use]
    pub const fn with_stack_max(mut self, stack_max: usize) -> Self {
        self.stack_max = stack_max;
        self
    }

    /// Active/désactive la trace d'exécution.
    #[must_use]
    pub const fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_builders() {
        let cfg = VmConfig::default();
        assert_eq!(cfg.stack_max, 256);
        assert!(!cfg.trace);
        let cfg = cfg.with_stack_max(4).with_trace(true);
        assert_eq!(cfg, VmConfig { stack_max: 4, trace: true });
    }
}

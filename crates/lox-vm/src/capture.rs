/* ------------------------ Outil de capture stdout ------------------------ */

use std::{
    io::{self, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Writer qui **capture** la sortie dans une String partagée (tests, REPL embarqué).
#[derive(Debug, Default, Clone)]
pub struct Captured(Arc<Mutex<String>>);

impl Captured {
    fn buf(&self) -> MutexGuard<'_, String> { self.0.lock().unwrap_or_else(PoisonError::into_inner) }

    /// Récupère le buffer (copie).
    pub fn get(&self) -> String { self.buf().clone() }

    /// Vide le buffer et rend son contenu.
    pub fn take(&self) -> String { std::mem::take(&mut *self.buf()) }

    /// Réinitialise le buffer.
    pub fn clear(&self) { self.buf().clear(); }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf().push_str(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_buffer() {
        let cap = Captured::default();
        let mut w = cap.clone();
        write!(w, "a{}", 1).unwrap();
        assert_eq!(cap.get(), "a1");
        assert_eq!(cap.take(), "a1");
        assert_eq!(cap.get(), "");
    }
}

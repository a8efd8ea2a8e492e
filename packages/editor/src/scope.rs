//! Scoped overrides of editor flags.
//!
//! A [`Scoped`] guard sets a flag on entry and restores the value it found
//! when dropped, including during unwinding. Nested scopes therefore
//! restore the outer scope's value rather than a fixed default.

use crate::editor::Editor;
use std::ops::{Deref, DerefMut};

pub(crate) struct Scoped<'a, T: Copy> {
    editor: &'a mut Editor,
    prior: T,
    restore: fn(&mut Editor, T),
}

impl<'a, T: Copy> Scoped<'a, T> {
    pub fn enter(
        editor: &'a mut Editor,
        value: T,
        get: fn(&Editor) -> T,
        set: fn(&mut Editor, T),
    ) -> Self {
        let prior = get(editor);
        set(editor, value);
        Self {
            editor,
            prior,
            restore: set,
        }
    }
}

impl<T: Copy> Deref for Scoped<'_, T> {
    type Target = Editor;

    fn deref(&self) -> &Editor {
        &*self.editor
    }
}

impl<T: Copy> DerefMut for Scoped<'_, T> {
    fn deref_mut(&mut self) -> &mut Editor {
        &mut *self.editor
    }
}

impl<T: Copy> Drop for Scoped<'_, T> {
    fn drop(&mut self) {
        (self.restore)(&mut *self.editor, self.prior);
    }
}

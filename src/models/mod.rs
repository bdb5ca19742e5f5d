//! Domain models for the notes service.
//!
//! - [`Note`]: a stored note with server-assigned identity.
//! - [`NoteInput`]: the client-editable part of a note, used for create and update.

mod note;

pub use note::*;

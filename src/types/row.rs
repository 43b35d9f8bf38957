use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{
    EMAIL_MAX_LENGTH, EMAIL_OFFSET, EMAIL_SIZE, ID_OFFSET, ID_SIZE, Key, ROW_SIZE,
    USERNAME_MAX_LENGTH, USERNAME_OFFSET, USERNAME_SIZE,
    error::{DatabaseError, Result},
};

/*
 * Row Layout (293 bytes)
 * ┌──────────┬───────────────────────────┬──────────────────────────────┐
 * │ id (4)   │ username (32 + NUL)       │ email (255 + NUL)            │
 * └──────────┴───────────────────────────┴──────────────────────────────┘
 * Bytes after a text's terminator are don't-care.
 */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: Key,
    pub username: String,
    pub email: String,
}

impl Row {
    pub fn new(id: Key, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id == 0 {
            return Err(DatabaseError::IdMustBePositive);
        }
        if self.username.len() > USERNAME_MAX_LENGTH || self.email.len() > EMAIL_MAX_LENGTH {
            return Err(DatabaseError::StringTooLong);
        }
        Ok(())
    }

    pub fn serialize(&self) -> [u8; ROW_SIZE] {
        let mut buffer = [0u8; ROW_SIZE];
        self.serialize_into(&mut buffer);
        buffer
    }

    /// Writes the fixed-width layout into `destination`, which must hold at
    /// least `ROW_SIZE` bytes. Text that does not fit its slot is cut at the
    /// slot width; callers validate first.
    pub fn serialize_into(&self, destination: &mut [u8]) {
        destination[ID_OFFSET..ID_OFFSET + ID_SIZE].copy_from_slice(&self.id.to_le_bytes());
        write_text(
            &mut destination[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE],
            &self.username,
        );
        write_text(
            &mut destination[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE],
            &self.email,
        );
    }

    /// Reads a row back from `source`, which must hold at least `ROW_SIZE`
    /// bytes. Texts stop at their terminator.
    pub fn deserialize(source: &[u8]) -> Self {
        let id = Key::from_le_bytes([
            source[ID_OFFSET],
            source[ID_OFFSET + 1],
            source[ID_OFFSET + 2],
            source[ID_OFFSET + 3],
        ]);
        Self {
            id,
            username: read_text(&source[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]),
            email: read_text(&source[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username, self.email)
    }
}

fn write_text(slot: &mut [u8], text: &str) {
    let bytes = text.as_bytes();
    let length = bytes.len().min(slot.len());
    slot[..length].copy_from_slice(&bytes[..length]);
    if length < slot.len() {
        slot[length] = 0;
    }
}

fn read_text(slot: &[u8]) -> String {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8_lossy(&slot[..end]).into_owned()
}

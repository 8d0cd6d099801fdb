// # Book
//
// A title owned by the library, with its copy counters.
//
// `available` is signed: the documented over-issuance race can drive it
// below zero and the mirror reports whatever the counters say.

use super::RecordId;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A book as held in the mirror
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Remote row id
    pub id: RecordId,

    #[serde(rename = "titulo", default, deserialize_with = "super::null_as_default")]
    pub title: String,

    #[serde(rename = "autor", default, deserialize_with = "super::null_as_default")]
    pub author: String,

    #[serde(default)]
    pub isbn: Option<String>,

    #[serde(rename = "categoria", default)]
    pub category: Option<String>,

    /// Publication year
    #[serde(rename = "ano", default)]
    pub year: Option<i32>,

    /// Total copies owned
    #[serde(rename = "quantidade", default, deserialize_with = "super::null_as_default")]
    pub quantity: i64,

    /// Copies currently free
    #[serde(rename = "disponivel", default, deserialize_with = "super::null_as_default")]
    pub available: i64,
}

/// Availability badge of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// No free copy
    Unavailable,
    /// Some copies out, some free
    Partial,
    /// Every copy on the shelf
    Available,
}

impl Book {
    /// Copies currently out on loan according to the counters
    pub fn copies_out(&self) -> i64 {
        self.quantity - self.available
    }

    /// Whether the book belongs in the loan candidate list
    pub fn has_free_copy(&self) -> bool {
        self.available > 0
    }

    pub fn availability(&self) -> Availability {
        if self.available <= 0 {
            Availability::Unavailable
        } else if self.available == self.quantity {
            Availability::Available
        } else {
            Availability::Partial
        }
    }
}

/// Fields supplied by the caller when cataloguing a new book
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub quantity: i64,
}

impl NewBook {
    /// Create a new book with the required fields
    pub fn new(title: impl Into<String>, author: impl Into<String>, quantity: i64) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: None,
            category: None,
            year: None,
            quantity,
        }
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Check the cataloguing constraints: title, author and at least one copy
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::invalid_input("book title is required"));
        }
        if self.author.trim().is_empty() {
            return Err(Error::invalid_input("book author is required"));
        }
        if self.quantity < 1 {
            return Err(Error::invalid_input(format!(
                "book quantity must be at least 1, got {}",
                self.quantity
            )));
        }
        Ok(())
    }

    /// Insert payload: every copy starts free
    pub(crate) fn into_insert(self) -> BookInsert {
        BookInsert {
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            category: self.category,
            year: self.year,
            quantity: self.quantity,
            available: self.quantity,
        }
    }
}

/// Remote insert layout for a book
#[derive(Debug, Serialize)]
pub(crate) struct BookInsert {
    #[serde(rename = "titulo")]
    title: String,
    #[serde(rename = "autor")]
    author: String,
    isbn: Option<String>,
    #[serde(rename = "categoria")]
    category: Option<String>,
    #[serde(rename = "ano")]
    year: Option<i32>,
    #[serde(rename = "quantidade")]
    quantity: i64,
    #[serde(rename = "disponivel")]
    available: i64,
}

/// Sparse update of a book
///
/// Only fields set to `Some` are sent to the store. Nullable columns use a
/// nested option: `Some(None)` clears the column.
///
/// When `quantity` changes the caller is responsible for supplying a matching
/// `available` (see [`BookPatch::resize`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookPatch {
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "autor", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<Option<String>>,

    #[serde(rename = "categoria", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,

    #[serde(rename = "ano", skip_serializing_if = "Option::is_none")]
    pub year: Option<Option<i32>>,

    #[serde(rename = "quantidade", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,

    #[serde(rename = "disponivel", skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
}

impl BookPatch {
    /// Patch that changes the copy count of `book`, carrying the adjusted
    /// free-copy count along: `max(0, available + (new_quantity - quantity))`
    pub fn resize(book: &Book, new_quantity: i64) -> Self {
        Self {
            quantity: Some(new_quantity),
            available: Some(Self::available_after_resize(book, new_quantity)),
            ..Self::default()
        }
    }

    /// Free copies after changing the copy count of `book`
    pub fn available_after_resize(book: &Book, new_quantity: i64) -> i64 {
        (book.available + (new_quantity - book.quantity)).max(0)
    }

    /// Whether the patch carries no field at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(Error::invalid_input("book title cannot be blank"));
        }
        if self.author.as_deref().is_some_and(|a| a.trim().is_empty()) {
            return Err(Error::invalid_input("book author cannot be blank"));
        }
        if let Some(quantity) = self.quantity
            && quantity < 1
        {
            return Err(Error::invalid_input(format!(
                "book quantity must be at least 1, got {}",
                quantity
            )));
        }
        Ok(())
    }
}

// # Member
//
// A registered library patron. Only active members may be offered as
// borrowers; that filter belongs to callers.

use super::RecordId;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A member as held in the mirror
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Remote row id
    pub id: RecordId,

    #[serde(rename = "nome", default, deserialize_with = "super::null_as_default")]
    pub name: String,

    /// Membership number
    #[serde(rename = "matricula", default)]
    pub membership_number: Option<String>,

    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,

    /// National ID (CPF)
    #[serde(rename = "cpf", default)]
    pub national_id: Option<String>,

    /// Absent on rows imported without a registration date
    #[serde(rename = "data_registro", default)]
    pub registered_on: Option<NaiveDate>,

    #[serde(rename = "ativo", default, deserialize_with = "super::null_as_default")]
    pub active: bool,
}

/// Fields supplied by the caller when registering a member
///
/// Registration date and active flag are not part of this type: they are
/// always stamped by the synchronizer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    pub name: String,
    pub membership_number: Option<String>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
}

impl NewMember {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            membership_number: None,
            phone: None,
            national_id: None,
        }
    }

    pub fn with_membership_number(mut self, number: impl Into<String>) -> Self {
        self.membership_number = Some(number.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_national_id(mut self, national_id: impl Into<String>) -> Self {
        self.national_id = Some(national_id.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("member name is required"));
        }
        Ok(())
    }

    pub(crate) fn into_insert(self, today: NaiveDate) -> MemberInsert {
        MemberInsert {
            name: self.name,
            membership_number: self.membership_number,
            phone: self.phone,
            national_id: self.national_id,
            registered_on: today,
            active: true,
        }
    }
}

/// Remote insert layout for a member
#[derive(Debug, Serialize)]
pub(crate) struct MemberInsert {
    #[serde(rename = "nome")]
    name: String,
    #[serde(rename = "matricula")]
    membership_number: Option<String>,
    #[serde(rename = "telefone")]
    phone: Option<String>,
    #[serde(rename = "cpf")]
    national_id: Option<String>,
    #[serde(rename = "data_registro")]
    registered_on: NaiveDate,
    #[serde(rename = "ativo")]
    active: bool,
}

/// Sparse update of a member
///
/// The registration date is not editable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberPatch {
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "matricula", skip_serializing_if = "Option::is_none")]
    pub membership_number: Option<Option<String>>,

    #[serde(rename = "telefone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,

    #[serde(rename = "cpf", skip_serializing_if = "Option::is_none")]
    pub national_id: Option<Option<String>>,

    #[serde(rename = "ativo", skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl MemberPatch {
    /// Patch that only flips the active flag
    pub fn set_active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(Error::invalid_input("member name cannot be blank"));
        }
        Ok(())
    }
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Contact resolution.
//!
//! Every relationship has at most two rows: the requesting user's own
//! (canonical) contact for the counter-party, and the counter-party's contact
//! pointing back (the mirror). Writes always land on the canonical side;
//! reads walk both.

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{LedgerError, Result};
use crate::models::{Contact, ContactId, ContactRef, ProfileId};
use crate::store;

/// Both sides of one user/counter-party relationship, as currently stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub user_id: ProfileId,
    pub canonical: Option<Contact>,
    pub mirror: Option<Contact>,
    pub counterparty: Option<ProfileId>,
}

impl Relationship {
    pub fn contact_ids(&self) -> Vec<ContactId> {
        self.canonical
            .iter()
            .chain(self.mirror.iter())
            .map(|c| c.id)
            .collect()
    }
}

/// A row of the user's contact list, native or virtual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactView {
    pub reference: ContactRef,
    pub name: String,
    pub linked_profile_id: Option<ProfileId>,
}

/// Create a contact owned by `owner_id`. When the contact links a profile the
/// call is find-or-create, so the `(owner, profile)` pair never repeats.
#[instrument(skip(conn))]
pub fn create_contact(
    conn: &Connection,
    owner_id: ProfileId,
    name: &str,
    linked_profile_id: Option<ProfileId>,
) -> Result<Contact> {
    store::atomic(conn, |conn| {
        store::get_profile(conn, owner_id)?;
        let Some(profile_id) = linked_profile_id else {
            let id = store::insert_contact(conn, owner_id, name, None)?;
            info!(contact_id = id, "contact created");
            return store::get_contact(conn, id);
        };
        if profile_id == owner_id {
            return Err(LedgerError::AmbiguousContact(owner_id));
        }
        store::get_profile(conn, profile_id)?;
        let created = store::insert_linked_contact_if_absent(conn, owner_id, name, profile_id)?;
        let contact = store::contact_for_link(conn, owner_id, profile_id)?
            .ok_or_else(|| LedgerError::not_found("contact for profile", profile_id))?;
        info!(contact_id = contact.id, created, "linked contact ready");
        Ok(contact)
    })
}

/// Map any reference to the requesting user's canonical contact id,
/// creating that contact if the user has never recorded the counter-party.
#[instrument(skip(conn), fields(reference = %reference))]
pub fn resolve(conn: &Connection, user_id: ProfileId, reference: &ContactRef) -> Result<ContactId> {
    store::atomic(conn, |conn| {
        let contact = store::get_contact(conn, reference.contact_id())?;
        match reference {
            ContactRef::Native(_) if contact.owner_id == user_id => Ok(contact.id),
            ContactRef::Native(_) if contact.linked_profile_id == Some(user_id) => {
                debug!(contact_id = contact.id, "native reference is owned by the other side");
                resolve_reverse(conn, user_id, &contact)
            }
            ContactRef::Native(id) => Err(LedgerError::AmbiguousContact(*id)),
            ContactRef::Reverse { owner_id, .. } => {
                check_reverse(user_id, *owner_id, &contact)?;
                resolve_reverse(conn, user_id, &contact)
            }
        }
    })
}

fn check_reverse(user_id: ProfileId, owner_id: ProfileId, theirs: &Contact) -> Result<()> {
    if owner_id == user_id
        || theirs.owner_id != owner_id
        || theirs.linked_profile_id != Some(user_id)
    {
        return Err(LedgerError::AmbiguousContact(theirs.id));
    }
    Ok(())
}

fn resolve_reverse(conn: &Connection, user_id: ProfileId, theirs: &Contact) -> Result<ContactId> {
    if let Some(mine) = store::contact_for_link(conn, user_id, theirs.owner_id)? {
        return Ok(mine.id);
    }
    let profile = store::get_profile(conn, theirs.owner_id)?;
    // the unique index absorbs a concurrent creator; re-read either way
    let created =
        store::insert_linked_contact_if_absent(conn, user_id, &profile.name, theirs.owner_id)?;
    let mine = store::contact_for_link(conn, user_id, theirs.owner_id)?
        .ok_or(LedgerError::AmbiguousContact(theirs.id))?;
    info!(
        contact_id = mine.id,
        counterparty = theirs.owner_id,
        created,
        "canonical contact resolved from reverse reference"
    );
    Ok(mine.id)
}

/// Read-only discovery of both sides of a relationship. Never creates rows.
pub fn relationship(
    conn: &Connection,
    user_id: ProfileId,
    reference: &ContactRef,
) -> Result<Relationship> {
    let contact = store::get_contact(conn, reference.contact_id())?;
    let owned = contact.owner_id == user_id;
    match reference {
        ContactRef::Native(_) if owned => {
            let counterparty = contact.linked_profile_id.filter(|p| *p != user_id);
            let mirror = match counterparty {
                Some(p) => store::contact_for_link(conn, p, user_id)?,
                None => None,
            };
            Ok(Relationship {
                user_id,
                canonical: Some(contact),
                mirror,
                counterparty,
            })
        }
        ContactRef::Native(_) if contact.linked_profile_id == Some(user_id) => {
            mirrored(conn, user_id, contact)
        }
        ContactRef::Native(id) => Err(LedgerError::AmbiguousContact(*id)),
        ContactRef::Reverse { owner_id, .. } => {
            check_reverse(user_id, *owner_id, &contact)?;
            mirrored(conn, user_id, contact)
        }
    }
}

fn mirrored(conn: &Connection, user_id: ProfileId, theirs: Contact) -> Result<Relationship> {
    let canonical = store::contact_for_link(conn, user_id, theirs.owner_id)?;
    Ok(Relationship {
        user_id,
        canonical,
        counterparty: Some(theirs.owner_id),
        mirror: Some(theirs),
    })
}

/// Native contacts plus one virtual entry per person who linked the user and
/// whom the user has not linked back yet. Sorted by name.
pub fn list_contacts(conn: &Connection, user_id: ProfileId) -> Result<Vec<ContactView>> {
    store::snapshot(conn, |conn| {
        let mine = store::contacts_for_owner(conn, user_id)?;
        let mut out: Vec<ContactView> = mine
            .iter()
            .map(|c| ContactView {
                reference: ContactRef::Native(c.id),
                name: c.name.clone(),
                linked_profile_id: c.linked_profile_id,
            })
            .collect();

        for theirs in store::contacts_linking_to(conn, user_id)? {
            let known = out
                .iter()
                .any(|v| v.linked_profile_id == Some(theirs.owner_id));
            if known {
                continue;
            }
            let owner = store::get_profile(conn, theirs.owner_id)?;
            out.push(ContactView {
                reference: ContactRef::Reverse {
                    contact_id: theirs.id,
                    owner_id: theirs.owner_id,
                },
                name: owner.name,
                linked_profile_id: Some(theirs.owner_id),
            });
        }

        out.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(out)
    })
}

/// Build the tagged reference for a raw contact id as the user sees it.
pub fn reference_for(
    conn: &Connection,
    user_id: ProfileId,
    contact_id: ContactId,
) -> Result<ContactRef> {
    let contact = store::get_contact(conn, contact_id)?;
    if contact.owner_id == user_id {
        Ok(ContactRef::Native(contact.id))
    } else if contact.linked_profile_id == Some(user_id) {
        Ok(ContactRef::Reverse {
            contact_id: contact.id,
            owner_id: contact.owner_id,
        })
    } else {
        Err(LedgerError::AmbiguousContact(contact.id))
    }
}

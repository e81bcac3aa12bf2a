//! Attendee role rules
//!
//! Report people are split into two partitions by role side: advisors and
//! interlocutors. Only attending people belong to a partition. The rules
//! kept here hold after every edit:
//! - at most one primary per partition
//! - a partition with exactly one attending member has that member primary
//! - non-attendees are never primary
//! - interlocutors are never authors
//! - at least one author remains (guarded by the toggles)

use crate::error::AttendeeWarning;
use crate::types::{ReportPerson, ReportPersonInput, Role};

/// Resolve the unset flags of a freshly picked person
///
/// Defaults: attending, not author, not primary, interlocutor when the
/// person has no account. An explicit author is never defaulted to
/// interlocutor.
#[must_use]
pub fn normalize_report_person(raw: ReportPersonInput) -> ReportPerson {
    let author = raw.author.unwrap_or(false);
    let interlocutor = raw.interlocutor.unwrap_or(!raw.is_user && !author);
    ReportPerson {
        uuid: raw.uuid,
        name: raw.name,
        rank: raw.rank,
        status: raw.status,
        is_user: raw.is_user,
        end_of_tour_date: raw.end_of_tour_date,
        position: raw.position,
        author,
        attendee: raw.attendee.unwrap_or(true),
        primary: raw.primary.unwrap_or(false),
        interlocutor,
    }
}

/// Normalize a whole picked list and apply the role rules
#[must_use]
pub fn normalize_report_people(raw: Vec<ReportPersonInput>) -> Vec<ReportPerson> {
    let mut people: Vec<ReportPerson> = raw.into_iter().map(normalize_report_person).collect();
    enforce_role_invariants(&mut people);
    people
}

/// Re-establish every role rule on `people`
pub fn enforce_role_invariants(people: &mut [ReportPerson]) {
    for p in people.iter_mut() {
        if p.author && p.interlocutor {
            // authors stay on the advisor side
            p.interlocutor = false;
        }
        if !p.attendee {
            p.primary = false;
        }
    }

    for role in [Role::Advisor, Role::Interlocutor] {
        let mut seen_primary = false;
        for p in people.iter_mut().filter(|p| p.partition() == Some(role)) {
            if p.primary {
                if seen_primary {
                    p.primary = false;
                }
                seen_primary = true;
            }
        }
    }

    force_only_attending_person_per_role_to_primary(people);
}

/// Promote the single attending member of a partition to primary
pub fn force_only_attending_person_per_role_to_primary(people: &mut [ReportPerson]) {
    for role in [Role::Advisor, Role::Interlocutor] {
        let mut members = people.iter_mut().filter(|p| p.partition() == Some(role));
        if let (Some(only), None) = (members.next(), members.next()) {
            only.primary = true;
        }
    }
}

/// The primary attendee of a partition, if any
#[must_use]
pub fn primary_attendee(people: &[ReportPerson], role: Role) -> Option<&ReportPerson> {
    people
        .iter()
        .find(|p| p.primary && p.partition() == Some(role))
}

fn find<'a>(people: &'a [ReportPerson], uuid: &str) -> Result<&'a ReportPerson, AttendeeWarning> {
    people
        .iter()
        .find(|p| p.is_same(uuid))
        .ok_or_else(|| AttendeeWarning::UnknownPerson(uuid.to_string()))
}

fn edited(
    people: &[ReportPerson],
    uuid: &str,
    edit: impl FnOnce(&mut ReportPerson),
) -> Vec<ReportPerson> {
    let mut next = people.to_vec();
    if let Some(p) = next.iter_mut().find(|p| p.is_same(uuid)) {
        edit(p);
    }
    enforce_role_invariants(&mut next);
    next
}

/// Flip the author flag of `uuid`
///
/// # Errors
/// - `RemovingSelfAuthor` when the acting user drops their own authorship
/// - `RemovingLastAuthor` when no other author would remain
/// - `InterlocutorCannotBeAuthor` when the person is an interlocutor
pub fn toggle_author(
    people: &[ReportPerson],
    acting_user: &str,
    uuid: &str,
) -> Result<Vec<ReportPerson>, AttendeeWarning> {
    let person = find(people, uuid)?;

    if person.author && person.is_same(acting_user) {
        return Err(AttendeeWarning::RemovingSelfAuthor);
    }
    let other_authors = people.iter().any(|p| p.author && !p.is_same(uuid));
    if person.author && !other_authors {
        return Err(AttendeeWarning::RemovingLastAuthor);
    }
    if !person.author && person.interlocutor {
        return Err(AttendeeWarning::InterlocutorCannotBeAuthor);
    }

    Ok(edited(people, uuid, |p| p.author = !p.author))
}

/// Flip the attendee flag of `uuid`
///
/// # Errors
/// `RemovingPrimaryAttendee` when the person is currently the attending primary
pub fn toggle_attendee(
    people: &[ReportPerson],
    uuid: &str,
) -> Result<Vec<ReportPerson>, AttendeeWarning> {
    let person = find(people, uuid)?;
    if person.attendee && person.primary {
        return Err(AttendeeWarning::RemovingPrimaryAttendee);
    }

    Ok(edited(people, uuid, |p| {
        p.attendee = !p.attendee;
        p.primary = false;
    }))
}

/// Flip the interlocutor flag of `uuid`, clearing its primary flag
///
/// # Errors
/// Only `UnknownPerson`; this toggle has no guard.
pub fn toggle_interlocutor(
    people: &[ReportPerson],
    uuid: &str,
) -> Result<Vec<ReportPerson>, AttendeeWarning> {
    find(people, uuid)?;
    Ok(edited(people, uuid, |p| {
        p.interlocutor = !p.interlocutor;
        p.primary = false;
    }))
}

/// Make `uuid` the primary of its partition
///
/// # Errors
/// `NotAttending` when the person does not attend
pub fn set_primary(
    people: &[ReportPerson],
    uuid: &str,
) -> Result<Vec<ReportPerson>, AttendeeWarning> {
    let person = find(people, uuid)?;
    let Some(role) = person.partition() else {
        return Err(AttendeeWarning::NotAttending);
    };

    let mut next = people.to_vec();
    for p in &mut next {
        if p.is_same(uuid) {
            p.primary = true;
        } else if p.role() == role {
            p.primary = false;
        }
    }
    enforce_role_invariants(&mut next);
    Ok(next)
}

/// Remove `uuid` from the report
///
/// # Errors
/// - `RemovingSelf` for the acting user
/// - `RemovingLastAuthor` when the person is the only author
pub fn remove_person(
    people: &[ReportPerson],
    acting_user: &str,
    uuid: &str,
) -> Result<Vec<ReportPerson>, AttendeeWarning> {
    let person = find(people, uuid)?;
    if person.is_same(acting_user) {
        return Err(AttendeeWarning::RemovingSelf);
    }
    if person.author && !people.iter().any(|p| p.author && !p.is_same(uuid)) {
        return Err(AttendeeWarning::RemovingLastAuthor);
    }

    let mut next: Vec<ReportPerson> = people.iter().filter(|p| !p.is_same(uuid)).cloned().collect();
    enforce_role_invariants(&mut next);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advisor(uuid: &str) -> ReportPersonInput {
        ReportPersonInput::new(uuid, uuid.to_uppercase()).user(true)
    }

    fn interlocutor(uuid: &str) -> ReportPersonInput {
        ReportPersonInput::new(uuid, uuid.to_uppercase()).user(false)
    }

    #[test]
    fn normalize_defaults_flags() {
        let p = normalize_report_person(advisor("a"));
        assert!(p.attendee);
        assert!(!p.author);
        assert!(!p.primary);
        assert!(!p.interlocutor);

        let q = normalize_report_person(interlocutor("b"));
        assert!(q.interlocutor);
    }

    #[test]
    fn normalize_keeps_explicit_flags() {
        let p = normalize_report_person(interlocutor("b").with_interlocutor(false).with_attendee(false));
        assert!(!p.interlocutor);
        assert!(!p.attendee);
    }

    #[test]
    fn explicit_author_is_not_defaulted_to_interlocutor() {
        let p = normalize_report_person(interlocutor("b").with_author(true));
        assert!(p.author);
        assert!(!p.interlocutor);
    }

    #[test]
    fn lone_attendees_are_promoted() {
        let people = normalize_report_people(vec![advisor("a"), interlocutor("b")]);
        assert!(people.iter().all(|p| p.primary));
    }

    #[test]
    fn second_primary_in_partition_is_cleared() {
        let people = normalize_report_people(vec![
            advisor("a").with_primary(true),
            advisor("c").with_primary(true),
        ]);
        assert!(people[0].primary);
        assert!(!people[1].primary);
    }

    #[test]
    fn non_attendee_loses_primary() {
        let people = normalize_report_people(vec![
            advisor("a").with_primary(true).with_attendee(false),
            advisor("c"),
            advisor("d"),
        ]);
        assert!(!people[0].primary);
        assert!(primary_attendee(&people, Role::Advisor).is_none());
    }

    #[test]
    fn toggle_interlocutor_on_author_is_a_no_op() {
        let people = normalize_report_people(vec![advisor("a").with_author(true)]);
        let next = toggle_interlocutor(&people, "a").unwrap();
        assert!(next[0].author);
        assert!(!next[0].interlocutor);
    }

    #[test]
    fn author_toggle_refused_for_interlocutor() {
        let people = normalize_report_people(vec![advisor("a").with_author(true), interlocutor("b")]);
        assert_eq!(
            toggle_author(&people, "a", "b"),
            Err(AttendeeWarning::InterlocutorCannotBeAuthor)
        );
    }

    #[test]
    fn set_primary_moves_primary_within_partition() {
        let people = normalize_report_people(vec![
            advisor("a").with_primary(true),
            advisor("c"),
            interlocutor("b"),
        ]);
        let next = set_primary(&people, "c").unwrap();
        assert!(!next[0].primary);
        assert!(next[1].primary);
        // other partition untouched
        assert!(next[2].primary);
    }

    #[test]
    fn set_primary_refuses_non_attendee() {
        let people = normalize_report_people(vec![
            advisor("a"),
            advisor("c").with_attendee(false),
        ]);
        assert_eq!(set_primary(&people, "c"), Err(AttendeeWarning::NotAttending));
    }

    #[test]
    fn remove_person_guards_self_and_last_author() {
        let people = normalize_report_people(vec![
            advisor("me").with_author(true),
            advisor("other").with_author(false),
        ]);
        assert_eq!(remove_person(&people, "me", "me"), Err(AttendeeWarning::RemovingSelf));

        let next = remove_person(&people, "me", "other").unwrap();
        assert_eq!(next.len(), 1);
        assert!(next[0].primary);

        let solo = normalize_report_people(vec![advisor("x").with_author(true), advisor("me")]);
        assert_eq!(
            remove_person(&solo, "me", "x"),
            Err(AttendeeWarning::RemovingLastAuthor)
        );
    }

    #[test]
    fn unknown_person_is_reported() {
        let people = normalize_report_people(vec![advisor("a")]);
        assert_eq!(
            toggle_attendee(&people, "zz"),
            Err(AttendeeWarning::UnknownPerson("zz".into()))
        );
    }
}

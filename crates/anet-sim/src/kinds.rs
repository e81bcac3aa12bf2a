//! Enumerations of the simulated entities, as the API spells them

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Side a person works for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonRole {
    Advisor,
    Principal,
}

impl PersonRole {
    pub const ALL: [PersonRole; 2] = [PersonRole::Advisor, PersonRole::Principal];

    /// Position type a person of this role can hold
    #[must_use]
    pub fn position_type(self) -> PositionType {
        match self {
            PersonRole::Advisor => PositionType::Advisor,
            PersonRole::Principal => PositionType::Principal,
        }
    }
}

/// Kind of position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionType {
    Advisor,
    Principal,
    SuperUser,
    Administrator,
}

impl PositionType {
    /// The two position types that appear on both sides of an engagement
    pub const SIDES: [PositionType; 2] = [PositionType::Advisor, PositionType::Principal];

    /// Random position type fitting an organization of `org_type`
    ///
    /// Advisor organizations get 90 % advisors, 9 % super users and 1 %
    /// administrators.
    pub fn random_for<R: Rng + ?Sized>(org_type: OrganizationType, rng: &mut R) -> Self {
        match org_type {
            OrganizationType::AdvisorOrg => {
                let roll: f64 = rng.gen();
                if roll < 0.9 {
                    PositionType::Advisor
                } else if roll < 0.99 {
                    PositionType::SuperUser
                } else {
                    PositionType::Administrator
                }
            }
            OrganizationType::PrincipalOrg => PositionType::Principal,
        }
    }

    /// Wire spelling, for inlined query arguments
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PositionType::Advisor => "ADVISOR",
            PositionType::Principal => "PRINCIPAL",
            PositionType::SuperUser => "SUPER_USER",
            PositionType::Administrator => "ADMINISTRATOR",
        }
    }
}

/// Kind of organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationType {
    AdvisorOrg,
    PrincipalOrg,
}

impl OrganizationType {
    pub const ALL: [OrganizationType; 2] = [OrganizationType::AdvisorOrg, OrganizationType::PrincipalOrg];

    /// Role of the people holding positions in such an organization
    #[must_use]
    pub fn person_role(self) -> PersonRole {
        match self {
            OrganizationType::AdvisorOrg => PersonRole::Advisor,
            OrganizationType::PrincipalOrg => PersonRole::Principal,
        }
    }
}

/// Entity a note can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoteTarget {
    AuthorizationGroups,
    Locations,
    Organizations,
    People,
    Positions,
    Reports,
    Tasks,
}

impl NoteTarget {
    /// Name of the list query over these entities
    #[must_use]
    pub fn list_query(self) -> &'static str {
        match self {
            NoteTarget::AuthorizationGroups => "authorizationGroupList",
            NoteTarget::Locations => "locationList",
            NoteTarget::Organizations => "organizationList",
            NoteTarget::People => "personList",
            NoteTarget::Positions => "positionList",
            NoteTarget::Reports => "reportList",
            NoteTarget::Tasks => "taskList",
        }
    }

    /// GraphQL type of the list query argument
    #[must_use]
    pub fn query_input(self) -> &'static str {
        match self {
            NoteTarget::AuthorizationGroups => "AuthorizationGroupSearchQueryInput",
            NoteTarget::Locations => "LocationSearchQueryInput",
            NoteTarget::Organizations => "OrganizationSearchQueryInput",
            NoteTarget::People => "PersonSearchQueryInput",
            NoteTarget::Positions => "PositionSearchQueryInput",
            NoteTarget::Reports => "ReportSearchQueryInput",
            NoteTarget::Tasks => "TaskSearchQueryInput",
        }
    }

    /// Value of `relatedObjectType` on a note
    #[must_use]
    pub fn related_object_type(self) -> &'static str {
        match self {
            NoteTarget::AuthorizationGroups => "authorizationGroups",
            NoteTarget::Locations => "locations",
            NoteTarget::Organizations => "organizations",
            NoteTarget::People => "people",
            NoteTarget::Positions => "positions",
            NoteTarget::Reports => "reports",
            NoteTarget::Tasks => "tasks",
        }
    }
}

//! Member directory and group membership lookups.
//!
//! The expense and settlement repositories consume these as external
//! collaborators: they only need to resolve display identities, obtain
//! the authoritative member set of a group, and check group existence.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::{group_members, groups, members};

/// Display identity of a member, used to populate responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberIdentity {
    /// Member ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional profile image URL.
    pub profile_image: Option<String>,
}

impl From<members::Model> for MemberIdentity {
    fn from(model: members::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            profile_image: model.profile_image,
        }
    }
}

/// Member directory repository.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    db: DatabaseConnection,
}

impl MemberRepository {
    /// Creates a new member repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Checks whether a group exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn group_exists(&self, group_id: Uuid) -> Result<bool, DbErr> {
        let group = groups::Entity::find_by_id(group_id).one(&self.db).await?;
        Ok(group.is_some())
    }

    /// Resolves a single member's display identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_identity(&self, member_id: Uuid) -> Result<Option<MemberIdentity>, DbErr> {
        let member = members::Entity::find_by_id(member_id).one(&self.db).await?;
        Ok(member.map(MemberIdentity::from))
    }

    /// Resolves display identities for a set of member IDs.
    ///
    /// The result may be smaller than the request if some IDs do not
    /// exist; callers that need a full resolution compare the sizes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_identities(&self, member_ids: &[Uuid]) -> Result<Vec<MemberIdentity>, DbErr> {
        if member_ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = members::Entity::find()
            .filter(members::Column::Id.is_in(member_ids.iter().copied()))
            .all(&self.db)
            .await?;

        Ok(found.into_iter().map(MemberIdentity::from).collect())
    }

    /// Returns the authoritative set of member IDs belonging to a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn member_ids_of_group(&self, group_id: Uuid) -> Result<Vec<Uuid>, DbErr> {
        let rows = group_members::Entity::find()
            .filter(group_members::Column::GroupId.eq(group_id))
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(|row| row.member_id).collect())
    }

    /// Returns the group's members with their display identities.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn members_of_group(&self, group_id: Uuid) -> Result<Vec<MemberIdentity>, DbErr> {
        let member_ids = self.member_ids_of_group(group_id).await?;
        self.find_identities(&member_ids).await
    }
}

//! The closed set of persisted entity types.

use crate::error::SecurityError;
use serde::{Deserialize, Serialize};

/// Whether an entity's records belong to one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoping {
    /// Every record carries `organizationId`; all access is constrained to one tenant.
    TenantScoped,
    /// Platform-wide records, never filtered by tenant.
    Global,
}

/// Every persisted record type.
///
/// [`Entity::scoping`] is an exhaustive match, so adding a variant does not
/// compile until it is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Entity {
    /// `User` records.
    User,
    /// `Payment` records.
    Payment,
    /// `File` records.
    File,
    /// `Notification` records.
    Notification,
    /// `UserNotification` records.
    UserNotification,
    /// `Announcement` records.
    Announcement,
    /// `DuesSettings` records.
    DuesSettings,
    /// `AssociationSettings` records.
    AssociationSettings,
    /// `ChatSession` records.
    ChatSession,
    /// `Document` records.
    Document,
    /// `Committee` records.
    Committee,
    /// `CommitteeMember` records.
    CommitteeMember,
    /// `DirectoryUpdateRequest` records.
    DirectoryUpdateRequest,
    /// `Pet` records.
    Pet,
    /// `Child` records.
    Child,
    /// `AdditionalResident` records.
    AdditionalResident,
    /// `PropertyUnit` records.
    PropertyUnit,
    /// `MessageFolder` records.
    MessageFolder,
    /// `Message` records.
    Message,
    /// `MessageRecipient` records.
    MessageRecipient,
    /// `Note` records.
    Note,
    /// `CalendarEvent` records.
    CalendarEvent,
    /// `Task` records.
    Task,
    /// `ChartOfAccounts` records.
    ChartOfAccounts,
    /// `Transaction` records.
    Transaction,
    /// `AnnualBudget` records.
    AnnualBudget,
    /// `Vendor` records.
    Vendor,
    /// `Invoice` records.
    Invoice,
    /// `PropertyListing` records.
    PropertyListing,
    /// `ResidentInquiry` records.
    ResidentInquiry,
    /// `PropertyAmenity` records.
    PropertyAmenity,
    /// `CustomRole` records.
    CustomRole,
    /// `RolePermission` records.
    RolePermission,
    /// `UserCustomRole` records.
    UserCustomRole,
    /// `CommunityPost` records.
    CommunityPost,
    /// `PostLike` records.
    PostLike,
    /// `PostComment` records.
    PostComment,
    /// `CommentLike` records.
    CommentLike,
    /// `MarketplaceApp` records.
    MarketplaceApp,
    /// `UserInstalledApp` records.
    UserInstalledApp,
    /// `AppUpdateHistory` records.
    AppUpdateHistory,
    /// `AppReview` records.
    AppReview,
    /// `Organization` records.
    Organization,
    /// `Account` records.
    Account,
    /// `VerificationToken` records.
    VerificationToken,
}

impl Entity {
    /// Every entity, in declaration order.
    pub const ALL: [Self; 45] = [
        Self::User,
        Self::Payment,
        Self::File,
        Self::Notification,
        Self::UserNotification,
        Self::Announcement,
        Self::DuesSettings,
        Self::AssociationSettings,
        Self::ChatSession,
        Self::Document,
        Self::Committee,
        Self::CommitteeMember,
        Self::DirectoryUpdateRequest,
        Self::Pet,
        Self::Child,
        Self::AdditionalResident,
        Self::PropertyUnit,
        Self::MessageFolder,
        Self::Message,
        Self::MessageRecipient,
        Self::Note,
        Self::CalendarEvent,
        Self::Task,
        Self::ChartOfAccounts,
        Self::Transaction,
        Self::AnnualBudget,
        Self::Vendor,
        Self::Invoice,
        Self::PropertyListing,
        Self::ResidentInquiry,
        Self::PropertyAmenity,
        Self::CustomRole,
        Self::RolePermission,
        Self::UserCustomRole,
        Self::CommunityPost,
        Self::PostLike,
        Self::PostComment,
        Self::CommentLike,
        Self::MarketplaceApp,
        Self::UserInstalledApp,
        Self::AppUpdateHistory,
        Self::AppReview,
        Self::Organization,
        Self::Account,
        Self::VerificationToken,
    ];

    /// Returns the entity name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Payment => "Payment",
            Self::File => "File",
            Self::Notification => "Notification",
            Self::UserNotification => "UserNotification",
            Self::Announcement => "Announcement",
            Self::DuesSettings => "DuesSettings",
            Self::AssociationSettings => "AssociationSettings",
            Self::ChatSession => "ChatSession",
            Self::Document => "Document",
            Self::Committee => "Committee",
            Self::CommitteeMember => "CommitteeMember",
            Self::DirectoryUpdateRequest => "DirectoryUpdateRequest",
            Self::Pet => "Pet",
            Self::Child => "Child",
            Self::AdditionalResident => "AdditionalResident",
            Self::PropertyUnit => "PropertyUnit",
            Self::MessageFolder => "MessageFolder",
            Self::Message => "Message",
            Self::MessageRecipient => "MessageRecipient",
            Self::Note => "Note",
            Self::CalendarEvent => "CalendarEvent",
            Self::Task => "Task",
            Self::ChartOfAccounts => "ChartOfAccounts",
            Self::Transaction => "Transaction",
            Self::AnnualBudget => "AnnualBudget",
            Self::Vendor => "Vendor",
            Self::Invoice => "Invoice",
            Self::PropertyListing => "PropertyListing",
            Self::ResidentInquiry => "ResidentInquiry",
            Self::PropertyAmenity => "PropertyAmenity",
            Self::CustomRole => "CustomRole",
            Self::RolePermission => "RolePermission",
            Self::UserCustomRole => "UserCustomRole",
            Self::CommunityPost => "CommunityPost",
            Self::PostLike => "PostLike",
            Self::PostComment => "PostComment",
            Self::CommentLike => "CommentLike",
            Self::MarketplaceApp => "MarketplaceApp",
            Self::UserInstalledApp => "UserInstalledApp",
            Self::AppUpdateHistory => "AppUpdateHistory",
            Self::AppReview => "AppReview",
            Self::Organization => "Organization",
            Self::Account => "Account",
            Self::VerificationToken => "VerificationToken",
        }
    }

    /// Returns how records of this entity are scoped.
    #[must_use]
    pub const fn scoping(&self) -> Scoping {
        match self {
            Self::User
            | Self::Payment
            | Self::File
            | Self::Notification
            | Self::UserNotification
            | Self::Announcement
            | Self::DuesSettings
            | Self::AssociationSettings
            | Self::ChatSession
            | Self::Document
            | Self::Committee
            | Self::CommitteeMember
            | Self::DirectoryUpdateRequest
            | Self::Pet
            | Self::Child
            | Self::AdditionalResident
            | Self::PropertyUnit
            | Self::MessageFolder
            | Self::Message
            | Self::MessageRecipient
            | Self::Note
            | Self::CalendarEvent
            | Self::Task
            | Self::ChartOfAccounts
            | Self::Transaction
            | Self::AnnualBudget
            | Self::Vendor
            | Self::Invoice
            | Self::PropertyListing
            | Self::ResidentInquiry
            | Self::PropertyAmenity
            | Self::CustomRole
            | Self::RolePermission
            | Self::UserCustomRole
            | Self::CommunityPost
            | Self::PostLike
            | Self::PostComment
            | Self::CommentLike
            | Self::MarketplaceApp
            | Self::UserInstalledApp
            | Self::AppUpdateHistory
            | Self::AppReview => Scoping::TenantScoped,
            Self::Organization
            | Self::Account
            | Self::VerificationToken => Scoping::Global,
        }
    }

    /// Returns true if records carry an `organizationId`.
    #[must_use]
    pub const fn is_tenant_scoped(&self) -> bool {
        matches!(self.scoping(), Scoping::TenantScoped)
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Entity {
    type Err = SecurityError;

    /// Parses an entity name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|entity| entity.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| SecurityError::invalid_query(format!("unknown entity '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Entity::Payment.is_tenant_scoped());
        assert!(Entity::User.is_tenant_scoped());
        assert!(Entity::AppReview.is_tenant_scoped());
        assert_eq!(Entity::Organization.scoping(), Scoping::Global);
        assert_eq!(Entity::Account.scoping(), Scoping::Global);
        assert_eq!(Entity::VerificationToken.scoping(), Scoping::Global);
    }

    #[test]
    fn test_counts() {
        let scoped = Entity::ALL.iter().filter(|e| e.is_tenant_scoped()).count();
        assert_eq!(scoped, 42);
        assert_eq!(Entity::ALL.len() - scoped, 3);
    }

    #[test]
    fn test_parse() {
        for entity in Entity::ALL {
            assert_eq!(entity.as_str().parse::<Entity>().unwrap(), entity);
        }
        assert_eq!("payment".parse::<Entity>().unwrap(), Entity::Payment);
        assert_eq!("calendarevent".parse::<Entity>().unwrap(), Entity::CalendarEvent);
        assert!("Spaceship".parse::<Entity>().is_err());
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&Entity::ChartOfAccounts).unwrap();
        assert_eq!(json, "\"ChartOfAccounts\"");
    }
}

//! `DBInstanceStatus` text-to-integer mapping.
//!
//! Kept in one place per spec, with every value the AWS RDS API is known to
//! return pinned by a test so a future upstream addition is caught instead of
//! silently falling through to `Unknown`.

/// Small integer enumeration exposed as `rds_instance_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum InstanceStatus {
    Available = 0,
    BackingUp = 1,
    Creating = 2,
    Deleting = 3,
    Failed = 4,
    Maintenance = 5,
    Modifying = 6,
    Rebooting = 7,
    Renaming = 8,
    ResettingMasterCredentials = 9,
    Starting = 10,
    Stopped = 11,
    Stopping = 12,
    Storage = 13,
    Upgrading = 14,
    IncompatibleParameters = 15,
    IncompatibleRestore = 16,
    InaccessibleEncryptionCredentials = 17,
    Unknown = 255,
}

impl InstanceStatus {
    #[must_use]
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Map the free-text `DBInstanceStatus` field to the fixed enumeration.
    ///
    /// Matching is case-insensitive since AWS has historically been
    /// inconsistent about casing across regions/API versions.
    #[must_use]
    pub fn from_upstream(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "available" => Self::Available,
            "backing-up" => Self::BackingUp,
            "creating" => Self::Creating,
            "deleting" => Self::Deleting,
            "failed" => Self::Failed,
            "maintenance" => Self::Maintenance,
            "modifying" => Self::Modifying,
            "rebooting" => Self::Rebooting,
            "renaming" => Self::Renaming,
            "resetting-master-credentials" => Self::ResettingMasterCredentials,
            "starting" => Self::Starting,
            "stopped" => Self::Stopped,
            "stopping" => Self::Stopping,
            "storage-optimization" | "storage-full" => Self::Storage,
            "upgrading" => Self::Upgrading,
            "incompatible-parameters" => Self::IncompatibleParameters,
            "incompatible-restore" => Self::IncompatibleRestore,
            "inaccessible-encryption-credentials" => Self::InaccessibleEncryptionCredentials,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_status_maps_to_a_distinct_non_unknown_code() {
        let known = [
            "available",
            "backing-up",
            "creating",
            "deleting",
            "failed",
            "maintenance",
            "modifying",
            "rebooting",
            "renaming",
            "resetting-master-credentials",
            "starting",
            "stopped",
            "stopping",
            "storage-optimization",
            "storage-full",
            "upgrading",
            "incompatible-parameters",
            "incompatible-restore",
            "inaccessible-encryption-credentials",
        ];

        for raw in known {
            let mapped = InstanceStatus::from_upstream(raw);
            assert_ne!(
                mapped,
                InstanceStatus::Unknown,
                "status {raw} unexpectedly mapped to Unknown"
            );
        }
    }

    #[test]
    fn unrecognized_status_maps_to_unknown() {
        assert_eq!(
            InstanceStatus::from_upstream("some-future-status"),
            InstanceStatus::Unknown
        );
    }

    #[test]
    fn mapping_is_case_insensitive() {
        assert_eq!(
            InstanceStatus::from_upstream("AVAILABLE"),
            InstanceStatus::Available
        );
    }

    #[test]
    fn storage_variants_share_a_code() {
        assert_eq!(
            InstanceStatus::from_upstream("storage-optimization").code(),
            InstanceStatus::from_upstream("storage-full").code()
        );
    }
}

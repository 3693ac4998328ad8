use super::*;

/// Position of a replica in the ordered replica set.
/// Only the replica at `Ordinal(0)` may ever found a cluster.
#[derive(
    Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display, FromStr,
)]
pub struct Ordinal(pub u32);

impl Ordinal {
    pub const FOUNDER: Ordinal = Ordinal(0);

    pub fn is_founder(self) -> bool {
        self == Self::FOUNDER
    }
}

/// Stable identity of this replica, derived once from the assigned network name.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub struct ReplicaIdentity {
    pub ordinal: Ordinal,
    pub peer_group: String,
    pub namespace: String,
}

impl ReplicaIdentity {
    /// Parse `<peer_group>-<digits>` into an identity.
    pub fn resolve(assigned_name: &str, peer_group: &str, namespace: &str) -> Result<Self, Error> {
        let malformed = || Error::MalformedIdentity {
            name: assigned_name.to_owned(),
            peer_group: peer_group.to_owned(),
        };

        // Some platforms hand out the fully qualified name,
        // `<name>.<peer_group>.<namespace>[.<suffix>]`. The labels present must agree.
        let mut labels = assigned_name.split('.');
        let short_name = labels.next().unwrap_or_default();
        if let Some(group_label) = labels.next() {
            if group_label != peer_group {
                return Err(malformed());
            }
            if labels.next().is_some_and(|ns| ns != namespace) {
                return Err(malformed());
            }
        }

        let digits = short_name
            .strip_prefix(peer_group)
            .and_then(|rest| rest.strip_prefix('-'))
            .ok_or_else(malformed)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        // `db-01` is not a name the controller would assign, and it would not
        // round-trip to the name siblings resolve.
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(malformed());
        }
        let ordinal = digits.parse::<Ordinal>().map_err(|_| malformed())?;

        Ok(Self {
            ordinal,
            peer_group: peer_group.to_owned(),
            namespace: namespace.to_owned(),
        })
    }

    /// Short hostname of the replica at `ordinal` in this peer group.
    pub fn sibling_name(&self, ordinal: Ordinal) -> String {
        format!("{}-{}", self.peer_group, ordinal)
    }

    /// `<peer_group>-<ordinal>.<peer_group>.<namespace>.<domain_suffix>`
    pub fn sibling_fqdn(&self, ordinal: Ordinal, domain_suffix: &str) -> String {
        format!(
            "{}.{}.{}.{}",
            self.sibling_name(ordinal),
            self.peer_group,
            self.namespace,
            domain_suffix
        )
    }

    pub fn name(&self) -> String {
        self.sibling_name(self.ordinal)
    }

    pub fn fqdn(&self, domain_suffix: &str) -> String {
        self.sibling_fqdn(self.ordinal, domain_suffix)
    }
}

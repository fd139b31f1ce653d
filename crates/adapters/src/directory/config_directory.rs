use std::collections::HashMap;

use domain::alert::error::AlertError;
use domain::common::entity::{CampaignId, OwnerId};
use ports::secondary::campaign_directory::CampaignDirectory;

/// Campaign directory loaded once from configuration.
///
/// The authoritative directory is an external collaborator; this
/// adapter covers deployments where the campaign set is provisioned
/// statically alongside the engine.
pub struct ConfigCampaignDirectory {
    entries: HashMap<CampaignId, (OwnerId, String)>,
}

impl ConfigCampaignDirectory {
    pub fn new(entries: impl IntoIterator<Item = (CampaignId, OwnerId, String)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(campaign, owner, name)| (campaign, (owner, name)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CampaignDirectory for ConfigCampaignDirectory {
    fn owner_of(&self, campaign: CampaignId) -> Result<Option<OwnerId>, AlertError> {
        Ok(self.entries.get(&campaign).map(|(owner, _)| *owner))
    }

    fn name_of(&self, campaign: CampaignId) -> Result<Option<String>, AlertError> {
        Ok(self.entries.get(&campaign).map(|(_, name)| name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_owner_and_name() {
        let campaign = CampaignId(uuid::Uuid::from_u128(1));
        let owner = OwnerId(uuid::Uuid::from_u128(2));
        let dir = ConfigCampaignDirectory::new([(campaign, owner, "Spring Sale".to_string())]);

        assert_eq!(dir.owner_of(campaign).unwrap(), Some(owner));
        assert_eq!(dir.name_of(campaign).unwrap().as_deref(), Some("Spring Sale"));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn unknown_campaign_is_none() {
        let dir = ConfigCampaignDirectory::new([]);
        let campaign = CampaignId(uuid::Uuid::from_u128(1));
        assert_eq!(dir.owner_of(campaign).unwrap(), None);
        assert_eq!(dir.name_of(campaign).unwrap(), None);
        assert!(dir.is_empty());
    }
}

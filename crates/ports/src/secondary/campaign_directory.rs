use domain::alert::error::AlertError;
use domain::common::entity::{CampaignId, OwnerId};

/// Campaign/user directory: resolves campaign references to their
/// owning user for fraud-alert scoping, and to display names for
/// listing enrichment.
pub trait CampaignDirectory: Send + Sync {
    /// Owner of the campaign, or `None` when the campaign is unknown.
    fn owner_of(&self, campaign: CampaignId) -> Result<Option<OwnerId>, AlertError>;

    /// Display name of the campaign. Best-effort: `None` when unknown.
    fn name_of(&self, campaign: CampaignId) -> Result<Option<String>, AlertError>;
}

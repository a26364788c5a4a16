//! Single-entity resources and their batch accessors.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use convene_core::{
    map_filters, AccessError, AccessFuture, EntityAccessor, FilterSet, PagingRequest, ProviderId,
    ValidationError,
};
use serde_json::Value;

use crate::client::ProviderClient;

/// Entity kinds that can be looked up by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    AffinityPerson,
    AffinityOrganization,
    AffinityOpportunity,
    AffinityInteraction,
    AffinityNote,
    HarmonicCompany,
    HarmonicPerson,
    HarmonicInvestor,
    HarmonicFundingRound,
    HarmonicIndustry,
}

impl Resource {
    pub const ALL: [Self; 10] = [
        Self::AffinityPerson,
        Self::AffinityOrganization,
        Self::AffinityOpportunity,
        Self::AffinityInteraction,
        Self::AffinityNote,
        Self::HarmonicCompany,
        Self::HarmonicPerson,
        Self::HarmonicInvestor,
        Self::HarmonicFundingRound,
        Self::HarmonicIndustry,
    ];

    pub const fn provider(self) -> ProviderId {
        match self {
            Self::AffinityPerson
            | Self::AffinityOrganization
            | Self::AffinityOpportunity
            | Self::AffinityInteraction
            | Self::AffinityNote => ProviderId::Affinity,
            Self::HarmonicCompany
            | Self::HarmonicPerson
            | Self::HarmonicInvestor
            | Self::HarmonicFundingRound
            | Self::HarmonicIndustry => ProviderId::Harmonic,
        }
    }

    /// Name unique within the resource's provider.
    pub const fn name(self) -> &'static str {
        match self {
            Self::AffinityPerson | Self::HarmonicPerson => "person",
            Self::AffinityOrganization => "organization",
            Self::AffinityOpportunity => "opportunity",
            Self::AffinityInteraction => "interaction",
            Self::AffinityNote => "note",
            Self::HarmonicCompany => "company",
            Self::HarmonicInvestor => "investor",
            Self::HarmonicFundingRound => "funding_round",
            Self::HarmonicIndustry => "industry",
        }
    }

    /// Collection path without the leading slash.
    pub const fn collection(self) -> &'static str {
        match self {
            Self::AffinityPerson => "persons",
            Self::AffinityOrganization => "organizations",
            Self::AffinityOpportunity => "opportunities",
            Self::AffinityInteraction => "interactions",
            Self::AffinityNote => "notes",
            Self::HarmonicCompany => "companies",
            Self::HarmonicPerson => "people",
            Self::HarmonicInvestor => "investors",
            Self::HarmonicFundingRound => "funding/rounds",
            Self::HarmonicIndustry => "industries",
        }
    }

    pub fn for_provider(provider: ProviderId) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |resource| resource.provider() == provider)
    }

    pub fn lookup(provider: ProviderId, name: &str) -> Result<Self, ValidationError> {
        Self::for_provider(provider)
            .find(|resource| resource.name() == name)
            .ok_or_else(|| ValidationError::ResourceProviderMismatch {
                resource: name.to_owned(),
                provider: provider.to_string(),
            })
    }

    /// Path of a single entity, with the id percent-encoded as one segment.
    pub fn item_path(self, id: &str) -> String {
        format!("/{}/{}", self.collection(), urlencoding::encode(id))
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider(), self.name())
    }
}

/// Looks up [`Resource`] entities by id through a [`ProviderClient`].
#[derive(Clone)]
pub struct ResourceAccessor {
    client: Arc<ProviderClient>,
    resource: Resource,
}

impl ResourceAccessor {
    pub fn new(client: Arc<ProviderClient>, resource: Resource) -> Result<Self, ValidationError> {
        if resource.provider() != client.provider() {
            return Err(ValidationError::ResourceProviderMismatch {
                resource: resource.to_string(),
                provider: client.provider().to_string(),
            });
        }
        Ok(Self { client, resource })
    }

    pub const fn resource(&self) -> Resource {
        self.resource
    }

    pub async fn get(&self, id: &str, filters: &FilterSet) -> Result<Value, AccessError> {
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyEntityId.into());
        }
        let query = map_filters(filters).query_pairs();
        self.client.get(&self.resource.item_path(id), &query).await
    }

    /// One page of the resource's collection.
    pub async fn list(
        &self,
        paging: &PagingRequest,
        filters: &FilterSet,
    ) -> Result<Value, AccessError> {
        let path = format!("/{}", self.resource.collection());
        self.client.list(&path, paging, filters).await
    }
}

impl EntityAccessor for ResourceAccessor {
    fn provider(&self) -> ProviderId {
        self.resource.provider()
    }

    fn operation(&self) -> &str {
        self.resource.collection()
    }

    fn fetch<'a>(&'a self, id: &'a str, filters: &'a FilterSet) -> AccessFuture<'a> {
        Box::pin(self.get(id, filters))
    }
}

//! First-sighting novel creation
//!
//! A novel id not yet in the store gets its detail page and cover fetched
//! once; the resulting record has no latest chapter until the discovery run
//! that follows fills it in.

use crate::crawler::extractor::extract_novel_detail;
use crate::crawler::fetcher::Fetcher;
use crate::model::{CoverRef, Novel};
use crate::storage::{cover_key, AssetStore, NovelStore};
use crate::{Result, StorageContext};

/// Result of looking a novel up
#[derive(Debug, Clone)]
pub struct BootstrapOutcome {
    pub novel: Novel,
    /// True when the novel was built from its detail page during this call
    pub created: bool,
}

/// Loads existing novels or builds new ones from their detail page
pub struct NovelBootstrap<'a> {
    fetcher: &'a Fetcher,
    /// Cover destination; `None` keeps covers inline
    assets: Option<&'a dyn AssetStore>,
}

impl<'a> NovelBootstrap<'a> {
    pub fn new(fetcher: &'a Fetcher, assets: Option<&'a dyn AssetStore>) -> Self {
        Self { fetcher, assets }
    }

    /// Returns the stored novel, or fetches and builds it when unseen
    ///
    /// The new record is not persisted here; the discovery run persists it
    /// together with its first latest-chapter pointer.
    pub async fn load_or_create<S: NovelStore>(
        &self,
        store: &S,
        novel_id: &str,
        novel_href: &str,
    ) -> Result<BootstrapOutcome> {
        if let Some(novel) = store
            .get_novel(novel_id)
            .with_context(|| format!("loading novel {}", novel_id))?
        {
            return Ok(BootstrapOutcome {
                novel,
                created: false,
            });
        }

        tracing::info!("New novel {}, fetching details from {}", novel_id, novel_href);
        let page = self.fetcher.fetch_page(novel_href).await?;
        let detail = extract_novel_detail(&page.body)?;

        let cover = match &detail.cover_href {
            Some(href) => Some(self.store_cover(novel_id, href).await?),
            None => {
                tracing::warn!("Novel {} has no cover image", novel_id);
                None
            }
        };

        Ok(BootstrapOutcome {
            novel: Novel {
                novel_id: novel_id.to_string(),
                title: detail.title,
                description: detail.description,
                cover,
                last_chapter: None,
            },
            created: true,
        })
    }

    async fn store_cover(&self, novel_id: &str, href: &str) -> Result<CoverRef> {
        let cover = self.fetcher.fetch_binary(href).await?;

        match self.assets {
            Some(assets) => {
                let key = cover_key(&cover.bytes, &cover.content_type);
                let key = assets
                    .upload(&key, &cover.bytes, &cover.content_type)
                    .with_context(|| format!("uploading cover of novel {}", novel_id))?;
                Ok(CoverRef::Stored {
                    key,
                    content_type: cover.content_type,
                })
            }
            None => Ok(CoverRef::Inline {
                data: cover.bytes,
                content_type: cover.content_type,
            }),
        }
    }
}

use crate::types::{ItemId, ItemReference, SpaceId};
use crate::{Error, HttpClient, Result};
use url::Url;

const ITEM_ID_PARAM: &str = "itemId";
const SPACE_ID_FIELD: &str = "\"activeGameSpaceId\":\"";

impl HttpClient {
    /// Turns a marketplace catalog URL into the item and space identifiers.
    ///
    /// The item id comes from the `itemId` query parameter and the space id
    /// from the `activeGameSpaceId` field embedded in the catalog page.
    pub async fn resolve(&self, catalog_url: &str) -> Result<ItemReference> {
        let item_id = parse_item_id(catalog_url)?;

        log::debug!("Fetching catalog page for {item_id}");
        let page = self
            .send(self.client.get(catalog_url))
            .await
            .map_err(|e| Error::Resolution(format!("catalog page unavailable: {e}")))?;

        let space_id = extract_space_id(&page)
            .ok_or_else(|| Error::Resolution("catalog page has no activeGameSpaceId".into()))?;

        Ok(ItemReference { item_id, space_id })
    }
}

pub(crate) fn parse_item_id(catalog_url: &str) -> Result<ItemId> {
    let url = Url::parse(catalog_url)
        .map_err(|e| Error::Resolution(format!("{catalog_url} is not a URL: {e}")))?;

    url.query_pairs()
        .find(|(key, _)| key == ITEM_ID_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|id| !id.is_empty())
        .map(ItemId::from)
        .ok_or_else(|| Error::Resolution(format!("{catalog_url} has no {ITEM_ID_PARAM}")))
}

pub(crate) fn extract_space_id(page: &str) -> Option<SpaceId> {
    let start = page.find(SPACE_ID_FIELD)? + SPACE_ID_FIELD.len();
    let rest = &page[start..];
    let id = &rest[..rest.find('"')?];

    (!id.is_empty()).then(|| SpaceId::from(id.to_string()))
}

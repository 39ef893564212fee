//! Result post-processing.
//!
//! Enriches a page of users with their attributes and group paths. Both
//! lookups are batched over the page's id set — two queries per page
//! regardless of page size, never one per user.

use std::collections::{BTreeMap, HashMap};

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::{group, group_membership, user_attribute};

/// Load every attribute of the given users as a per-user name → values
/// multimap. Rows are ordered by name and value so repeated searches render
/// identically.
pub async fn load_attribute_map(
    db: &DatabaseConnection,
    user_ids: &[Uuid],
) -> Result<HashMap<Uuid, BTreeMap<String, Vec<String>>>, DbErr> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = user_attribute::Entity::find()
        .filter(user_attribute::Column::UserId.is_in(user_ids.iter().copied()))
        .order_by_asc(user_attribute::Column::Name)
        .order_by_asc(user_attribute::Column::Value)
        .all(db)
        .await?;

    let mut map: HashMap<Uuid, BTreeMap<String, Vec<String>>> = HashMap::new();
    for row in rows {
        map.entry(row.user_id)
            .or_default()
            .entry(row.name)
            .or_default()
            .push(row.value);
    }
    Ok(map)
}

/// Resolve group paths for the given users: one membership query keyed by
/// the id set, one query for the realm's groups, paths assembled in memory.
pub async fn load_group_paths(
    db: &DatabaseConnection,
    realm_id: &str,
    user_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<String>>, DbErr> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let memberships = group_membership::Entity::find()
        .filter(group_membership::Column::UserId.is_in(user_ids.iter().copied()))
        .all(db)
        .await?;
    if memberships.is_empty() {
        return Ok(HashMap::new());
    }
    let groups = group::Entity::find()
        .filter(group::Column::RealmId.eq(realm_id))
        .all(db)
        .await?;
    let paths = group_paths(&groups);

    let mut map: HashMap<Uuid, Vec<String>> = HashMap::new();
    for membership in memberships {
        // Memberships pointing outside the realm's group set are dropped.
        if let Some(path) = paths.get(&membership.group_id) {
            map.entry(membership.user_id).or_default().push(path.clone());
        }
    }
    for paths in map.values_mut() {
        paths.sort();
    }
    Ok(map)
}

/// Build the `/`-joined ancestor path of every group in the set. A dangling
/// `parent_id` roots the chain at the last resolvable group; the hop count
/// is capped at the set size so a corrupt parent cycle terminates.
pub(crate) fn group_paths(groups: &[group::Model]) -> HashMap<Uuid, String> {
    let by_id: HashMap<Uuid, &group::Model> = groups.iter().map(|g| (g.id, g)).collect();
    let mut paths = HashMap::with_capacity(groups.len());
    for group in groups {
        let mut segments = vec![group.name.as_str()];
        let mut cursor = group.parent_id;
        let mut hops = 0;
        while let Some(parent_id) = cursor {
            hops += 1;
            if hops > groups.len() {
                break;
            }
            match by_id.get(&parent_id) {
                Some(parent) => {
                    segments.push(parent.name.as_str());
                    cursor = parent.parent_id;
                }
                None => break,
            }
        }
        segments.reverse();
        paths.insert(group.id, format!("/{}", segments.join("/")));
    }
    paths
}

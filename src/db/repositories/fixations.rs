use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Row, Transaction};

use crate::db::{
    connection::Database,
    helpers::{
        conversion_error, parse_datetime, patch_column, region_column, to_i64, to_optional_usize,
        to_usize,
    },
    models::{BlockRecord, ImageStats, PatchUsage, PrecomputeParams, StoredFixation},
};
use crate::fixation::stats::median_of_sorted;
use crate::models::{FixationEvent, LabeledFixation};
use crate::semantic::PatchSize;

/// Key of a precomputed-fixation lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixationQuery {
    pub image_id: i64,
    pub participant_id: Option<i64>,
    pub patch_size: PatchSize,
}

fn row_to_fixation(row: &Row) -> Result<FixationEvent, rusqlite::Error> {
    Ok(FixationEvent {
        participant_id: row.get("participant_id")?,
        image_id: row.get("image_id")?,
        start: row.get("start_time")?,
        end: row.get("end_time")?,
        duration: row.get("duration")?,
        x_centroid: row.get("x_centroid")?,
        y_centroid: row.get("y_centroid")?,
        point_count: to_usize(row.get("point_count")?, "point_count").map_err(conversion_error)?,
    })
}

fn row_to_stored_fixation(row: &Row) -> Result<StoredFixation, rusqlite::Error> {
    Ok(StoredFixation {
        fixation: row_to_fixation(row)?,
        patch_10: to_optional_usize(row.get("patch_10")?, "patch_10").map_err(conversion_error)?,
        patch_20: to_optional_usize(row.get("patch_20")?, "patch_20").map_err(conversion_error)?,
        patch_40: to_optional_usize(row.get("patch_40")?, "patch_40").map_err(conversion_error)?,
        region_10: row.get("region_10")?,
        region_20: row.get("region_20")?,
        region_40: row.get("region_40")?,
    })
}

fn row_to_block(row: &Row) -> Result<BlockRecord, rusqlite::Error> {
    let populated_at: String = row.get("populated_at")?;

    Ok(BlockRecord {
        image_id: row.get("image_id")?,
        participant_id: row.get("participant_id")?,
        fixation_count: to_usize(row.get("fixation_count")?, "fixation_count")
            .map_err(conversion_error)?,
        params: PrecomputeParams {
            velocity_threshold: row.get("velocity_threshold")?,
            min_duration: row.get("min_duration")?,
            image_width: row.get("image_width")?,
            image_height: row.get("image_height")?,
        },
        populated_at: parse_datetime(&populated_at, "populated_at").map_err(conversion_error)?,
    })
}

fn delete_block(tx: &Transaction<'_>, image_id: i64, participant_id: i64) -> Result<()> {
    tx.execute(
        "DELETE FROM fixations WHERE image_id = ?1 AND participant_id = ?2",
        params![image_id, participant_id],
    )?;
    tx.execute(
        "DELETE FROM precomputed_blocks WHERE image_id = ?1 AND participant_id = ?2",
        params![image_id, participant_id],
    )?;
    Ok(())
}

impl Database {
    /// Replace whole (image, participant) blocks in one transaction.
    ///
    /// Every block gets a bookkeeping row even when it has no fixations, so an empty
    /// block is distinguishable from a block that was never precomputed.
    pub async fn replace_blocks(
        &self,
        run: PrecomputeParams,
        blocks: Vec<((i64, i64), Vec<StoredFixation>)>,
    ) -> Result<usize> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let populated_at = Utc::now().to_rfc3339();
            let mut inserted = 0;

            for ((image_id, participant_id), fixations) in &blocks {
                delete_block(&tx, *image_id, *participant_id)
                    .with_context(|| {
                        format!("failed to clear block ({image_id}, {participant_id})")
                    })?;

                for stored in fixations {
                    let fixation = &stored.fixation;
                    tx.execute(
                        "INSERT INTO fixations (
                            image_id,
                            participant_id,
                            start_time,
                            end_time,
                            duration,
                            x_centroid,
                            y_centroid,
                            point_count,
                            patch_10,
                            patch_20,
                            patch_40,
                            region_10,
                            region_20,
                            region_40
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                        params![
                            image_id,
                            participant_id,
                            fixation.start,
                            fixation.end,
                            fixation.duration,
                            fixation.x_centroid,
                            fixation.y_centroid,
                            to_i64(fixation.point_count)?,
                            stored.patch_10.map(to_i64).transpose()?,
                            stored.patch_20.map(to_i64).transpose()?,
                            stored.patch_40.map(to_i64).transpose()?,
                            stored.region_10,
                            stored.region_20,
                            stored.region_40,
                        ],
                    )
                    .with_context(|| "failed to insert fixation")?;
                    inserted += 1;
                }

                tx.execute(
                    "INSERT INTO precomputed_blocks (
                        image_id,
                        participant_id,
                        fixation_count,
                        velocity_threshold,
                        min_duration,
                        image_width,
                        image_height,
                        populated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        image_id,
                        participant_id,
                        to_i64(fixations.len())?,
                        run.velocity_threshold,
                        run.min_duration,
                        run.image_width,
                        run.image_height,
                        populated_at,
                    ],
                )
                .with_context(|| "failed to record precomputed block")?;
            }

            tx.commit()?;
            Ok(inserted)
        })
        .await
    }

    pub async fn get_blocks(
        &self,
        image_id: i64,
        participant_id: Option<i64>,
    ) -> Result<Vec<BlockRecord>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT
                    image_id,
                    participant_id,
                    fixation_count,
                    velocity_threshold,
                    min_duration,
                    image_width,
                    image_height,
                    populated_at
                FROM precomputed_blocks
                WHERE image_id = ?1 AND (?2 IS NULL OR participant_id = ?2)
                ORDER BY participant_id ASC",
            )?;

            let blocks_iter =
                stmt.query_map(params![image_id, participant_id], |row| row_to_block(row))?;

            let mut blocks = Vec::new();
            for block in blocks_iter {
                blocks.push(block?);
            }
            Ok(blocks)
        })
        .await
    }

    /// Fixations of an image (optionally one participant), labelled at `patch_size`.
    ///
    /// Ordered by participant, then start time.
    pub async fn get_fixations(&self, query: FixationQuery) -> Result<Vec<LabeledFixation>> {
        self.execute(move |conn| {
            let sql = format!(
                "SELECT
                    image_id,
                    participant_id,
                    start_time,
                    end_time,
                    duration,
                    x_centroid,
                    y_centroid,
                    point_count,
                    {patch} AS patch_index,
                    {region} AS region
                FROM fixations
                WHERE image_id = ?1 AND (?2 IS NULL OR participant_id = ?2)
                ORDER BY participant_id ASC, start_time ASC",
                patch = patch_column(query.patch_size),
                region = region_column(query.patch_size),
            );
            let mut stmt = conn.prepare(&sql)?;

            let query_params = params![query.image_id, query.participant_id];
            let fixations_iter = stmt.query_map(query_params, |row| {
                Ok(LabeledFixation {
                    fixation: row_to_fixation(row)?,
                    region: row.get("region")?,
                    patch_index: to_optional_usize(row.get("patch_index")?, "patch_index")
                        .map_err(conversion_error)?,
                })
            })?;

            let mut fixations = Vec::new();
            for fixation in fixations_iter {
                fixations.push(fixation?);
            }
            Ok(fixations)
        })
        .await
    }

    /// Full rows with every patch size, mainly for export and inspection.
    pub async fn get_stored_fixations(
        &self,
        image_id: i64,
        participant_id: Option<i64>,
    ) -> Result<Vec<StoredFixation>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT
                    image_id,
                    participant_id,
                    start_time,
                    end_time,
                    duration,
                    x_centroid,
                    y_centroid,
                    point_count,
                    patch_10,
                    patch_20,
                    patch_40,
                    region_10,
                    region_20,
                    region_40
                FROM fixations
                WHERE image_id = ?1 AND (?2 IS NULL OR participant_id = ?2)
                ORDER BY participant_id ASC, start_time ASC",
            )?;

            let rows = stmt.query_map(params![image_id, participant_id], |row| {
                row_to_stored_fixation(row)
            })?;

            let mut fixations = Vec::new();
            for row in rows {
                fixations.push(row?);
            }
            Ok(fixations)
        })
        .await
    }

    /// Remove blocks for an image (or one participant on it); returns deleted fixations.
    pub async fn delete_blocks(&self, image_id: i64, participant_id: Option<i64>) -> Result<usize> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            let deleted = tx.execute(
                "DELETE FROM fixations WHERE image_id = ?1 AND (?2 IS NULL OR participant_id = ?2)",
                params![image_id, participant_id],
            )?;
            tx.execute(
                "DELETE FROM precomputed_blocks WHERE image_id = ?1 AND (?2 IS NULL OR participant_id = ?2)",
                params![image_id, participant_id],
            )?;
            tx.commit()?;
            Ok(deleted)
        })
        .await
    }

    pub async fn get_precomputed_images(&self) -> Result<Vec<i64>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT image_id FROM precomputed_blocks ORDER BY image_id ASC",
            )?;
            let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;

            let mut images = Vec::new();
            for row in rows {
                images.push(row?);
            }
            Ok(images)
        })
        .await
    }

    /// Counts, durations and patch coverage for one image; `None` if it has no fixations.
    pub async fn get_image_stats(&self, image_id: i64) -> Result<Option<ImageStats>> {
        let stored = self.get_stored_fixations(image_id, None).await?;
        if stored.is_empty() {
            return Ok(None);
        }

        let mut durations: Vec<f64> = stored.iter().map(|s| s.fixation.duration).collect();
        durations.sort_by(|a, b| a.total_cmp(b));

        let mut per_participant: BTreeMap<i64, usize> = BTreeMap::new();
        for row in &stored {
            *per_participant.entry(row.fixation.participant_id).or_insert(0) += 1;
        }

        let patch_usage = PatchSize::ALL
            .iter()
            .map(|&size| {
                let unique: HashSet<usize> =
                    stored.iter().filter_map(|row| row.patch(size)).collect();
                PatchUsage {
                    patch_size: size.pixels(),
                    unique_patches: unique.len(),
                }
            })
            .collect();

        Ok(Some(ImageStats {
            image_id,
            total_fixations: stored.len(),
            participants: per_participant.len(),
            avg_duration: durations.iter().sum::<f64>() / durations.len() as f64,
            median_duration: median_of_sorted(&durations),
            fixations_per_participant: per_participant,
            patch_usage,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PrecomputeParams {
        PrecomputeParams {
            velocity_threshold: 1.15,
            min_duration: 0.0,
            image_width: 800,
            image_height: 600,
        }
    }

    fn stored(
        participant: i64,
        image: i64,
        start: f64,
        patch_40: Option<usize>,
        region: &str,
    ) -> StoredFixation {
        StoredFixation {
            fixation: FixationEvent {
                participant_id: participant,
                image_id: image,
                start,
                end: start + 0.5,
                duration: 0.5,
                x_centroid: 10.0,
                y_centroid: 20.0,
                point_count: 5,
            },
            patch_10: patch_40.map(|p| p * 16),
            patch_20: patch_40.map(|p| p * 4),
            patch_40,
            region_10: region.to_string(),
            region_20: region.to_string(),
            region_40: region.to_string(),
        }
    }

    #[tokio::test]
    async fn blocks_round_trip_through_sqlite() {
        let db = Database::in_memory().unwrap();
        let blocks = vec![
            ((3, 1), vec![stored(1, 3, 1.0, Some(7), "sky"), stored(1, 3, 0.0, None, "unknown")]),
            ((3, 2), Vec::new()),
        ];

        assert_eq!(db.replace_blocks(params(), blocks).await.unwrap(), 2);

        let fixations = db
            .get_fixations(FixationQuery {
                image_id: 3,
                participant_id: Some(1),
                patch_size: PatchSize::Px40,
            })
            .await
            .unwrap();
        assert_eq!(fixations.len(), 2);
        assert_eq!(fixations[0].fixation.start, 0.0);
        assert_eq!(fixations[0].patch_index, None);
        assert_eq!(fixations[1].patch_index, Some(7));
        assert_eq!(fixations[1].region, "sky");

        let blocks = db.get_blocks(3, None).await.unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].fixation_count, 0);
        assert_eq!(blocks[0].params, params());
    }

    #[tokio::test]
    async fn replacing_a_block_drops_previous_rows() {
        let db = Database::in_memory().unwrap();
        db.replace_blocks(params(), vec![((3, 1), vec![stored(1, 3, 0.0, Some(1), "sky")])])
            .await
            .unwrap();
        db.replace_blocks(params(), vec![((3, 1), vec![stored(1, 3, 5.0, Some(2), "road")])])
            .await
            .unwrap();

        let rows = db.get_stored_fixations(3, Some(1)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].region_40, "road");
    }

    #[tokio::test]
    async fn delete_is_scoped_to_key() {
        let db = Database::in_memory().unwrap();
        db.replace_blocks(
            params(),
            vec![
                ((3, 1), vec![stored(1, 3, 0.0, Some(1), "sky")]),
                ((3, 2), vec![stored(2, 3, 0.0, Some(1), "sky")]),
                ((4, 1), vec![stored(1, 4, 0.0, Some(1), "sky")]),
            ],
        )
        .await
        .unwrap();

        assert_eq!(db.delete_blocks(3, Some(1)).await.unwrap(), 1);
        assert_eq!(db.get_blocks(3, None).await.unwrap().len(), 1);
        assert_eq!(db.delete_blocks(3, None).await.unwrap(), 1);
        assert_eq!(db.get_precomputed_images().await.unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn image_stats_cover_patch_usage() {
        let db = Database::in_memory().unwrap();
        db.replace_blocks(
            params(),
            vec![
                (
                    (3, 1),
                    vec![stored(1, 3, 0.0, Some(1), "sky"), stored(1, 3, 1.0, Some(2), "sky")],
                ),
                ((3, 2), vec![stored(2, 3, 0.0, Some(1), "sky")]),
            ],
        )
        .await
        .unwrap();

        let stats = db.get_image_stats(3).await.unwrap().unwrap();
        assert_eq!(stats.total_fixations, 3);
        assert_eq!(stats.participants, 2);
        assert_eq!(stats.median_duration, 0.5);
        let usage_40 = stats.patch_usage.iter().find(|u| u.patch_size == 40).unwrap();
        assert_eq!(usage_40.unique_patches, 2);
        assert!(db.get_image_stats(99).await.unwrap().is_none());
    }
}

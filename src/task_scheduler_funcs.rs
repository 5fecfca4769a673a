use anyhow::{bail, Result};
use std::{sync::Arc, time::Duration};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::{
    constants::TASK_SCHED_TARGET,
    data_backend::{CachedMenuStore, MenuStore},
};

/// Keeps the offline cache warm by re-fetching every restaurant on a fixed interval.
pub async fn start_menu_refresh_job<R>(
    sched: &JobScheduler,
    store: Arc<CachedMenuStore<R>>,
    restaurant_ids: Vec<String>,
    every_minutes: u64,
) -> Result<Uuid>
where
    R: MenuStore + 'static,
{
    if every_minutes == 0 {
        bail!("refresh interval must be at least one minute");
    }
    let restaurant_ids = Arc::new(restaurant_ids);

    let refresh_job = Job::new_repeated_async(
        Duration::from_secs(every_minutes * 60),
        move |_uuid, mut _l| {
            let store = Arc::clone(&store);
            let restaurant_ids = Arc::clone(&restaurant_ids);

            Box::pin(async move {
                log::info!(target: TASK_SCHED_TARGET, "Updating menu cache...");
                store.refresh(&restaurant_ids).await;
            })
        },
    )?;

    let uuid = refresh_job.guid();
    sched.add(refresh_job).await?;
    log::info!(
        target: TASK_SCHED_TARGET,
        "Menu refresh every {} min, job {}",
        every_minutes,
        uuid
    );

    Ok(uuid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_backend::{InMemoryMenuStore, SqliteMenuStore};

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CachedMenuStore::new(
            InMemoryMenuStore::new(vec![]),
            SqliteMenuStore::open(dir.path().join("cache.sqlite")).unwrap(),
        ));
        let sched = JobScheduler::new().await.unwrap();

        assert!(start_menu_refresh_job(&sched, store, vec![], 0)
            .await
            .is_err());
    }
}

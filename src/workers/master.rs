use crate::infrastructure::storage::ObjectStorage;
use crate::workers::renditions::{scaled_width, Rendition};
use anyhow::Result;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub fn master_key(video_id: &str) -> String {
    format!("{}/hls/master.m3u8", video_id)
}

/// Render the master playlist for the given renditions. Callers pass
/// the list already sorted by ascending height.
pub fn render_master(renditions: &[Rendition], source_width: u32, source_height: u32) -> String {
    let mut out = String::from("#EXTM3U\n#EXT-X-VERSION:3\n");
    for rendition in renditions {
        let width = scaled_width(source_width, source_height, rendition.height);
        out.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}x{}\n{}\n",
            rendition.bandwidth, width, rendition.height, rendition.playlist_path
        ));
    }
    out
}

/// Republishes the master playlist as renditions complete. The
/// completions list and the upload sit inside one critical section, so
/// concurrent completions cannot interleave and every published master
/// is a consistent snapshot.
pub struct MasterPublisher {
    storage: Arc<dyn ObjectStorage>,
    key: String,
    source_width: u32,
    source_height: u32,
    completed: Mutex<Vec<Rendition>>,
}

impl MasterPublisher {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        video_id: &str,
        source_width: u32,
        source_height: u32,
    ) -> Self {
        Self {
            storage,
            key: master_key(video_id),
            source_width,
            source_height,
            completed: Mutex::new(Vec::new()),
        }
    }

    /// Record a completed rendition and republish the master playlist,
    /// sorted by ascending height regardless of completion order.
    pub async fn publish(&self, rendition: Rendition) -> Result<()> {
        let mut completed = self.completed.lock().await;
        let height = rendition.height;
        completed.push(rendition);
        completed.sort_by_key(|r| r.height);

        let body = render_master(&completed, self.source_width, self.source_height);
        self.storage
            .put_bytes(&self.key, Bytes::from(body.into_bytes()))
            .await?;

        info!(
            height,
            renditions = completed.len(),
            "Republished master playlist"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::memory::MemoryStorage;

    fn renditions(heights: &[u32]) -> Vec<Rendition> {
        heights.iter().map(|&h| Rendition::for_height(h)).collect()
    }

    #[test]
    fn master_lists_renditions_with_exact_tags() {
        let out = render_master(&renditions(&[360, 720]), 1280, 720);
        assert_eq!(
            out,
            "#EXTM3U\n\
             #EXT-X-VERSION:3\n\
             #EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360\n\
             360p/playlist.m3u8\n\
             #EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720\n\
             720p/playlist.m3u8\n"
        );
    }

    #[test]
    fn empty_master_is_just_the_header() {
        assert_eq!(render_master(&[], 1280, 720), "#EXTM3U\n#EXT-X-VERSION:3\n");
    }

    #[tokio::test]
    async fn publishes_sorted_regardless_of_completion_order() {
        let storage = Arc::new(MemoryStorage::new());
        let publisher = MasterPublisher::new(storage.clone(), "V", 1920, 1080);

        publisher.publish(Rendition::for_height(1080)).await.unwrap();
        publisher.publish(Rendition::for_height(360)).await.unwrap();
        publisher.publish(Rendition::for_height(720)).await.unwrap();

        let master = String::from_utf8(storage.get("V/hls/master.m3u8").unwrap()).unwrap();
        let uris: Vec<&str> = master
            .lines()
            .filter(|l| !l.starts_with('#'))
            .collect();
        assert_eq!(
            uris,
            vec!["360p/playlist.m3u8", "720p/playlist.m3u8", "1080p/playlist.m3u8"]
        );
    }

    #[tokio::test]
    async fn ascending_completions_grow_the_master_monotonically() {
        let storage = Arc::new(MemoryStorage::new());
        let publisher = MasterPublisher::new(storage.clone(), "V", 1920, 1080);

        for height in [360, 720, 1080] {
            publisher.publish(Rendition::for_height(height)).await.unwrap();
        }

        let snapshots = storage.puts_for("V/hls/master.m3u8");
        assert_eq!(snapshots.len(), 3);
        // each snapshot is a byte prefix of the next
        for pair in snapshots.windows(2) {
            assert!(pair[1].starts_with(&pair[0]));
        }
        let final_master = String::from_utf8(snapshots[2].clone()).unwrap();
        assert_eq!(
            final_master,
            render_master(&renditions(&[360, 720, 1080]), 1920, 1080)
        );
    }

    #[tokio::test]
    async fn concurrent_completions_never_drop_an_entry() {
        let heights: Vec<u32> = (1u32..=8).map(|i| i * 120).collect();
        let storage = Arc::new(MemoryStorage::new());
        let publisher = Arc::new(MasterPublisher::new(storage.clone(), "V", 1920, 1080));

        let mut tasks = tokio::task::JoinSet::new();
        for &height in &heights {
            let publisher = publisher.clone();
            tasks.spawn(async move { publisher.publish(Rendition::for_height(height)).await });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        let snapshots = storage.puts_for("V/hls/master.m3u8");
        assert_eq!(snapshots.len(), heights.len());

        // publishes were serialized: each snapshot has one more entry
        for (i, snapshot) in snapshots.iter().enumerate() {
            let body = String::from_utf8(snapshot.clone()).unwrap();
            assert!(body.starts_with("#EXTM3U\n#EXT-X-VERSION:3\n"));
            let entries = body.lines().filter(|l| l.starts_with("#EXT-X-STREAM-INF:")).count();
            assert_eq!(entries, i + 1);
        }

        let final_master =
            String::from_utf8(storage.get("V/hls/master.m3u8").unwrap()).unwrap();
        for height in heights {
            assert!(final_master.contains(&format!("{}p/playlist.m3u8", height)));
        }
    }
}

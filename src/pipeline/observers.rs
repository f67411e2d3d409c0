//! Observer pattern for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! the episode loop to specific output formats.

use std::{
    collections::VecDeque,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{Error, Result, pipeline::training::EpisodeStats};

/// Observer for training lifecycle events.
///
/// All methods have default no-op implementations, so observers only
/// implement the hooks they care about.
pub trait Observer: Send {
    /// Called once before the first episode
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        Ok(())
    }

    /// Called after each episode with that episode's statistics
    fn on_episode_end(&mut self, _stats: &EpisodeStats) -> Result<()> {
        Ok(())
    }

    /// Called once after the last episode
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Rolling window over recent episodes, shared by the console and progress
/// bar observers so both report the same smoothed numbers.
#[derive(Debug)]
struct RollingWindow {
    window: VecDeque<(f64, usize)>,
    capacity: usize,
}

impl RollingWindow {
    fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, reward: f64, hits: usize) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back((reward, hits));
    }

    fn avg_reward(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let total: f64 = self.window.iter().map(|&(reward, _)| reward).sum();
        total / self.window.len() as f64
    }

    fn avg_hits(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let total: usize = self.window.iter().map(|&(_, hits)| hits).sum();
        total as f64 / self.window.len() as f64
    }
}

/// Observer that displays a progress bar during training
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    window: RollingWindow,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            window: RollingWindow::new(50),
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        let progress_bar = ProgressBar::new(total_episodes as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes ({msg})",
                )
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(progress_bar);
        Ok(())
    }

    fn on_episode_end(&mut self, stats: &EpisodeStats) -> Result<()> {
        self.window.push(stats.reward, stats.hits);
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.set_position((stats.episode + 1) as u64);
            progress_bar.set_message(format!(
                "avg_reward={:.2} avg_hits={:.2} epsilon={:.3}",
                self.window.avg_reward(),
                self.window.avg_hits(),
                stats.epsilon
            ));
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.finish_with_message("training complete");
        }
        Ok(())
    }
}

/// Observer that logs a summary line to stdout every N episodes
pub struct ConsoleLogObserver {
    every: usize,
    window: RollingWindow,
}

impl ConsoleLogObserver {
    /// Create an observer logging every `every` episodes.
    ///
    /// The averages cover at most the last `every` episodes, so each log line
    /// summarizes the stretch since the previous one.
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            window: RollingWindow::new(every.max(1)),
        }
    }
}

impl Observer for ConsoleLogObserver {
    fn on_episode_end(&mut self, stats: &EpisodeStats) -> Result<()> {
        self.window.push(stats.reward, stats.hits);
        let episode = stats.episode + 1;
        if episode % self.every == 0 {
            println!(
                "episode={} avg_reward={:.2} avg_hits={:.2} epsilon={:.3}",
                episode,
                self.window.avg_reward(),
                self.window.avg_hits(),
                stats.epsilon
            );
        }
        Ok(())
    }
}

/// Observer that writes per-episode statistics as JSON Lines
pub struct JsonlObserver {
    writer: BufWriter<File>,
}

impl JsonlObserver {
    /// Create an observer writing to the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl Observer for JsonlObserver {
    fn on_episode_end(&mut self, stats: &EpisodeStats) -> Result<()> {
        serde_json::to_writer(&mut self.writer, stats)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Observer that appends per-episode statistics to a CSV file
pub struct CsvObserver {
    writer: csv::Writer<File>,
}

impl CsvObserver {
    /// Create an observer writing to the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let writer = csv::Writer::from_path(path)?;
        Ok(Self { writer })
    }
}

impl Observer for CsvObserver {
    fn on_episode_end(&mut self, stats: &EpisodeStats) -> Result<()> {
        self.writer.serialize(stats)?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn stats(episode: usize, reward: f64, hits: usize) -> EpisodeStats {
        EpisodeStats {
            episode,
            reward,
            hits,
            steps: 10,
            epsilon: 0.5,
        }
    }

    #[test]
    fn test_rolling_window_averages() {
        let mut window = RollingWindow::new(3);
        assert_eq!(window.avg_reward(), 0.0);

        window.push(1.0, 2);
        window.push(3.0, 4);
        assert_eq!(window.avg_reward(), 2.0);
        assert_eq!(window.avg_hits(), 3.0);

        // Four pushes into a window of three drop the oldest entry.
        window.push(5.0, 6);
        window.push(7.0, 8);
        assert_eq!(window.avg_reward(), 5.0);
        assert_eq!(window.avg_hits(), 6.0);
    }

    #[test]
    fn test_jsonl_observer_writes_one_line_per_episode() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("episodes.jsonl");

        let mut observer = JsonlObserver::new(&path).expect("Failed to create observer");
        observer.on_training_start(3).expect("Start should succeed");
        for episode in 0..3 {
            observer
                .on_episode_end(&stats(episode, episode as f64, episode))
                .expect("Episode hook should succeed");
        }
        observer.on_training_end().expect("End should succeed");
        drop(observer);

        let mut contents = String::new();
        File::open(&path)
            .expect("Failed to open output")
            .read_to_string(&mut contents)
            .expect("Failed to read output");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        for (episode, line) in lines.iter().enumerate() {
            let record: serde_json::Value =
                serde_json::from_str(line).expect("Line should be valid JSON");
            assert_eq!(record["episode"], episode);
        }
    }

    #[test]
    fn test_csv_observer_writes_header_and_rows() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("episodes.csv");

        let mut observer = CsvObserver::new(&path).expect("Failed to create observer");
        observer
            .on_episode_end(&stats(0, 1.0, 1))
            .expect("Episode hook should succeed");
        observer
            .on_episode_end(&stats(1, -1.0, 0))
            .expect("Episode hook should succeed");
        observer.on_training_end().expect("End should succeed");
        drop(observer);

        let mut contents = String::new();
        File::open(&path)
            .expect("Failed to open output")
            .read_to_string(&mut contents)
            .expect("Failed to read output");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "episode,reward,hits,steps,epsilon");
        assert!(lines[1].starts_with("0,1.0,1,"));
        assert!(lines[2].starts_with("1,-1.0,0,"));
    }

    #[test]
    fn test_console_log_observer_window_matches_interval() {
        let mut observer = ConsoleLogObserver::new(2);
        observer
            .on_episode_end(&stats(0, 4.0, 4))
            .expect("Episode hook should succeed");
        observer
            .on_episode_end(&stats(1, 2.0, 2))
            .expect("Episode hook should succeed");
        observer
            .on_episode_end(&stats(2, 0.0, 0))
            .expect("Episode hook should succeed");

        // Window holds the last two episodes only.
        assert_eq!(observer.window.avg_reward(), 1.0);
        assert_eq!(observer.window.avg_hits(), 1.0);
    }
}

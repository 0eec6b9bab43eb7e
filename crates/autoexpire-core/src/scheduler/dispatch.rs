/// Which side of the site a request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Client {
    #[default]
    Site,
    Administrator,
}

/// The parts of an incoming request that decide whether rules run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CronRequest {
    /// Value of the `task` parameter
    pub task: Option<String>,
    /// Value of the boolean `cron` parameter
    pub cron: bool,
    pub client: Client,
}

impl CronRequest {
    /// A site-side cron request, as sent by the system scheduler
    pub fn scheduled() -> Self {
        Self {
            task: Some("cron".to_string()),
            cron: true,
            client: Client::Site,
        }
    }

    /// Only cron requests on the public site trigger the rules
    pub fn is_cron(&self) -> bool {
        let task_is_cron = self.task.as_deref().map(str::trim) == Some("cron");
        (task_is_cron || self.cron) && self.client == Client::Site
    }
}

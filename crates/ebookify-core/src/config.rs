//! Environment-driven configuration.
//!
//! Loaded once at boot via [`Config::from_env`]. Every knob has a default
//! that works for local development; production deployments override through
//! the environment (a `.env` file is honored via dotenvy).

use std::env;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Root of the temporary asset area. Also holds the job snapshot file.
    pub work_dir: PathBuf,
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    /// Seconds a job and its assets stay servable after creation.
    pub job_ttl_secs: u64,
    /// Cadence of the background retention sweep.
    pub cleanup_interval_secs: u64,
    /// Cadence of the advisory progress ticker.
    pub progress_tick_ms: u64,
    /// Grace delay between serving a download and reclaiming its assets, so
    /// a slow client retry within the window still succeeds.
    pub download_grace_secs: u64,
    /// When true, view requests also arm the delete-after-serve timer.
    pub delete_after_view: bool,
    pub ebook_convert_path: String,
    pub ocr_space_api_key: Option<String>,
    pub ocr_space_endpoint: String,
    pub cors_origins: Vec<String>,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const MAX_FILE_SIZE_MB: usize = 50;
        const JOB_TTL_SECS: u64 = 3600;
        const CLEANUP_INTERVAL_SECS: u64 = 3600;
        const PROGRESS_TICK_MS: u64 = 2000;
        const DOWNLOAD_GRACE_SECS: u64 = 5;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let allowed_extensions = env::var("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| "pdf,jpg,jpeg,png,tif,tiff,bmp,webp".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|_| {
                "application/pdf,image/jpeg,image/png,image/tiff,image/bmp,image/webp"
                    .to_string()
            })
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let work_dir = env::var("WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("ebookify"));

        Ok(Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            work_dir,
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_extensions,
            allowed_content_types,
            job_ttl_secs: env::var("JOB_TTL_SECS")
                .unwrap_or_else(|_| JOB_TTL_SECS.to_string())
                .parse()
                .unwrap_or(JOB_TTL_SECS),
            cleanup_interval_secs: env::var("CLEANUP_INTERVAL_SECS")
                .unwrap_or_else(|_| CLEANUP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(CLEANUP_INTERVAL_SECS),
            progress_tick_ms: env::var("PROGRESS_TICK_MS")
                .unwrap_or_else(|_| PROGRESS_TICK_MS.to_string())
                .parse()
                .unwrap_or(PROGRESS_TICK_MS),
            download_grace_secs: env::var("DOWNLOAD_GRACE_SECS")
                .unwrap_or_else(|_| DOWNLOAD_GRACE_SECS.to_string())
                .parse()
                .unwrap_or(DOWNLOAD_GRACE_SECS),
            delete_after_view: env::var("DELETE_AFTER_VIEW")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            ebook_convert_path: env::var("EBOOK_CONVERT_PATH")
                .unwrap_or_else(|_| "ebook-convert".to_string()),
            ocr_space_api_key: env::var("OCR_SPACE_API_KEY").ok(),
            ocr_space_endpoint: env::var("OCR_SPACE_ENDPOINT")
                .unwrap_or_else(|_| "https://api.ocr.space/parse/image".to_string()),
            cors_origins,
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn job_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.job_ttl_secs as i64)
    }

    pub fn job_ttl_std(&self) -> StdDuration {
        StdDuration::from_secs(self.job_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.cleanup_interval_secs)
    }

    pub fn progress_tick(&self) -> StdDuration {
        StdDuration::from_millis(self.progress_tick_ms)
    }

    pub fn download_grace(&self) -> StdDuration {
        StdDuration::from_secs(self.download_grace_secs)
    }
}

//! Layered configuration: `config.toml` (base) < `config.local.toml`
//! (git-ignored overrides) < `GRAPHDB_*` environment variables, following
//! the teacher's `figment`-based `Config::load` shape.

use std::path::PathBuf;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub csv: CsvDefaultsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database directory; holds per-table column-chunk files, the catalog
    /// file, the WAL, and `extension/`. `Database::open` always overwrites
    /// this with its own `path` argument after loading, so the default here
    /// only matters for a config file that omits `storage.data_dir`
    /// entirely.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Rows per node group (§3 "node groups of fixed capacity
    /// `NODE_GROUP_SIZE`"). Must be a power of two so
    /// `InternalId::node_group_idx`'s bit-shift decomposition holds.
    #[serde(default = "default_node_group_size")]
    pub node_group_size: u64,

    /// Target rels-per-slot density used by the CSR gap policy (§3): a
    /// node's list of length `n` gets `ceil(n / packed_csr_density)` slots.
    #[serde(default = "default_packed_csr_density")]
    pub packed_csr_density: f64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("graphdb_data")
}

fn default_node_group_size() -> u64 {
    1 << 18
}

fn default_packed_csr_density() -> f64 {
    0.8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Worker pool size; `0` means `num_cpus::get()`.
    #[serde(default)]
    pub worker_threads: usize,

    /// Bytes per parallel CSV scan block (§4.I `PARALLEL_BLOCK_SIZE`).
    #[serde(default = "default_parallel_block_size")]
    pub parallel_block_size: usize,

    /// Cap on cached (not yet surfaced) CSV warnings per block (§4.I
    /// `maxCachedErrorCount`).
    #[serde(default = "default_max_cached_error_count")]
    pub max_cached_error_count: usize,
}

fn default_parallel_block_size() -> usize {
    4 * 1024 * 1024
}

fn default_max_cached_error_count() -> usize {
    1024
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        PerformanceConfig {
            worker_threads: 0,
            parallel_block_size: default_parallel_block_size(),
            max_cached_error_count: default_max_cached_error_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvDefaultsConfig {
    /// Whether a `COPY ... FROM` that doesn't set `HEADER` explicitly
    /// treats the file's first line as data rather than a header to skip
    /// (§8 scenario S4 copies ten data-only lines with no `HEADER` option
    /// and expects all ten to surface as conversion warnings).
    #[serde(default)]
    pub header: bool,
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default)]
    pub ignore_errors: bool,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

fn default_sample_size() -> usize {
    1024
}

fn default_true() -> bool {
    true
}

impl Default for CsvDefaultsConfig {
    fn default() -> Self {
        CsvDefaultsConfig {
            header: false,
            parallel: true,
            ignore_errors: false,
            sample_size: default_sample_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level(), format: default_log_format() }
    }
}

impl Config {
    /// Merges `config.toml`, `config.local.toml`, and `GRAPHDB_*`
    /// environment overrides (double-underscore nested keys), the same
    /// three-layer precedence the teacher's `Config::load` uses.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Toml::file("config.local.toml"))
            .merge(Env::prefixed("GRAPHDB_").split("__"))
            .extract()
    }

    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new().merge(Toml::file(path)).merge(Env::prefixed("GRAPHDB_").split("__")).extract()
    }

    pub fn in_memory() -> Self {
        Config {
            storage: StorageConfig {
                data_dir: PathBuf::from(":memory:"),
                node_group_size: default_node_group_size(),
                packed_csr_density: default_packed_csr_density(),
            },
            performance: PerformanceConfig::default(),
            csv: CsvDefaultsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_config_has_power_of_two_node_group_size() {
        let cfg = Config::in_memory();
        assert!(cfg.storage.node_group_size.is_power_of_two());
    }
}

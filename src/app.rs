use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Datelike;
use serde::Serialize;
use tracing::{info, warn};

use crate::container::{self, ConversionInput, ConvertItem, StackItem};
use crate::decode::RecordSource;
use crate::domain::{ByteOrder, DownloadTask, Resolution, VariableName};
use crate::error::PiomasError;
use crate::fs_util;
use crate::grid::parse_grid;
use crate::psc::{PscClient, resolve_download_url};

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub skip_existing: bool,
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub stack_years: bool,
    pub byte_order: ByteOrder,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub items: Vec<DownloadItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadItem {
    pub variable: String,
    pub year: i32,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnzipReport {
    pub items: Vec<UnzipItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnzipItem {
    pub archive: String,
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    pub grid_size: usize,
    pub items: Vec<ConvertItem>,
    pub stacked: Vec<StackItem>,
}

/// Sequential downloader and converter for a fixed set of variables and
/// years. One network request, one decode and one container write at a time;
/// a failed task is warned about and skipped, never retried.
pub struct Downloader<C: PscClient> {
    client: C,
    dest_dir: Utf8PathBuf,
    base_url: String,
    variables: Vec<VariableName>,
    years: Vec<i32>,
}

impl<C: PscClient> Downloader<C> {
    pub fn new(
        client: C,
        dest_dir: Utf8PathBuf,
        base_url: String,
        variables: Vec<VariableName>,
        years: Vec<i32>,
    ) -> Self {
        Self {
            client,
            dest_dir,
            base_url,
            variables,
            years,
        }
    }

    pub fn dest_dir(&self) -> &Utf8Path {
        &self.dest_dir
    }

    fn tasks(&self) -> impl Iterator<Item = DownloadTask> + '_ {
        self.variables.iter().flat_map(|variable| {
            self.years.iter().map(|year| DownloadTask {
                variable: variable.clone(),
                year: *year,
            })
        })
    }

    /// Resolve and download every (variable, year) pair, one at a time.
    pub fn download(&self, options: &FetchOptions) -> Result<DownloadReport, PiomasError> {
        fs::create_dir_all(self.dest_dir.as_std_path())
            .map_err(|err| PiomasError::Filesystem(format!("create {}: {err}", self.dest_dir)))?;

        let mut items = Vec::new();
        for task in self.tasks() {
            let folder = task.variable.descriptor().folder;
            let index_url = format!("{}/{}", self.base_url, folder);
            let page = self.client.fetch_index(&index_url)?;

            let url = match resolve_download_url(&index_url, &page, &task) {
                Resolution::Url(url) => url,
                Resolution::Skipped(reason) => {
                    warn!("{reason}");
                    info!("skip {} of year {}", task.variable, task.year);
                    items.push(DownloadItem {
                        variable: task.variable.to_string(),
                        year: task.year,
                        action: "skipped".to_string(),
                        path: None,
                        detail: Some(reason.to_string()),
                    });
                    continue;
                }
            };

            let file_name = url.rsplit('/').next().unwrap_or_default().to_string();
            let dest_file = self.dest_dir.join(&file_name);

            if options.skip_existing && dest_file.as_std_path().exists() {
                info!("{dest_file} already exists, skipped");
                items.push(DownloadItem {
                    variable: task.variable.to_string(),
                    year: task.year,
                    action: "exists".to_string(),
                    path: Some(dest_file.to_string()),
                    detail: None,
                });
                continue;
            }

            info!("downloading {dest_file}");
            self.client.download(&url, dest_file.as_std_path())?;
            items.push(DownloadItem {
                variable: task.variable.to_string(),
                year: task.year,
                action: "downloaded".to_string(),
                path: Some(dest_file.to_string()),
                detail: None,
            });
        }

        info!("file transfer complete, output saved to {}", self.dest_dir);
        Ok(DownloadReport { items })
    }

    /// Gunzip every downloaded `<short_name>.H<year>.gz` archive in place.
    pub fn unzip(&self, skip_existing: bool) -> Result<UnzipReport, PiomasError> {
        let mut items = Vec::new();
        for task in self.tasks() {
            let gz_path = self.dest_dir.join(format!("{}.gz", task.file_name()));
            if !gz_path.as_std_path().exists() {
                continue;
            }

            let out_path = self.dest_dir.join(task.file_name());
            if skip_existing && out_path.as_std_path().exists() {
                info!("{out_path} already exists, skipped");
                items.push(UnzipItem {
                    archive: gz_path.to_string(),
                    action: "exists".to_string(),
                });
                continue;
            }

            info!("unzipping {gz_path}");
            fs_util::gunzip_file(&gz_path)?;
            items.push(UnzipItem {
                archive: gz_path.to_string(),
                action: "unzipped".to_string(),
            });
        }
        Ok(UnzipReport { items })
    }

    /// Convert all downloaded raw files into one NetCDF container, then
    /// optionally stack same-variable years along a `year` coordinate.
    pub fn to_netcdf(
        &self,
        file_out: &Utf8Path,
        options: &ConvertOptions,
    ) -> Result<ConvertReport, PiomasError> {
        let grid = parse_grid(&self.client.fetch_grid()?)?;

        let mut inputs = Vec::new();
        for task in self.tasks() {
            let file = self.dest_dir.join(task.file_name());
            if !file.as_std_path().exists() {
                continue;
            }
            let desc = task.variable.descriptor();
            inputs.push(ConversionInput {
                file,
                source: RecordSource {
                    short_name: desc.short_name.to_string(),
                    year: task.year,
                    long_name: desc.long_name.to_string(),
                    units: desc.units.to_string(),
                },
            });
        }

        let current_year = chrono::Local::now().year();
        let items =
            container::convert_batch(&inputs, &grid, file_out, options.byte_order, current_year)?;

        let mut stacked = Vec::new();
        if options.stack_years {
            info!("stacking multiple years");
            let file_tmp = Utf8PathBuf::from(format!("{file_out}.tmp"));
            if file_tmp.as_std_path().exists() {
                fs::remove_file(file_tmp.as_std_path())
                    .map_err(|err| PiomasError::Filesystem(format!("remove {file_tmp}: {err}")))?;
            }

            for variable in &self.variables {
                match container::stack_years(file_out, &file_tmp, variable.as_str()) {
                    Ok(Some(item)) => stacked.push(item),
                    Ok(None) => {}
                    Err(
                        err @ (PiomasError::DimensionConflict { .. }
                        | PiomasError::YearMismatch { .. }),
                    ) => {
                        warn!("not stacking {variable}: {err}");
                    }
                    Err(err) => return Err(err),
                }
            }

            if file_tmp.as_std_path().exists() {
                fs::remove_file(file_out.as_std_path())
                    .map_err(|err| PiomasError::Filesystem(format!("remove {file_out}: {err}")))?;
                fs::rename(file_tmp.as_std_path(), file_out.as_std_path())
                    .map_err(|err| PiomasError::Filesystem(format!("rename {file_tmp}: {err}")))?;
            }
        }

        info!("NetCDF file generated at {file_out}");
        Ok(ConvertReport {
            grid_size: grid.len(),
            items,
            stacked,
        })
    }
}

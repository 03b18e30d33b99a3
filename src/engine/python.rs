use super::{types::*, Engine};
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const RUNNER_SCRIPT: &str = "md_runner.py";

/// Runs pymupdf4llm through `scripts/md_runner.py`, one process per call.
pub struct PythonEngine {
    cfg: Config,
    script: PathBuf,
    python_exe: PathBuf,
}

impl PythonEngine {
    pub fn new(cfg: &Config) -> Result<Self> {
        let scripts_dir = PathBuf::from(&cfg.paths.scripts_dir);
        if cfg.security.pin_scripts_dir {
            let cwd = std::env::current_dir().with_context(|| "current_dir")?;
            let canon = scripts_dir
                .canonicalize()
                .with_context(|| format!("canonicalize scripts_dir: {}", scripts_dir.display()))?;
            if !canon.starts_with(&cwd) {
                return Err(anyhow!(
                    "scripts_dir is outside cwd while pin_scripts_dir=true: {}",
                    canon.display()
                ));
            }
        }
        let script = scripts_dir.join(RUNNER_SCRIPT);
        if !script.exists() {
            return Err(anyhow!("missing script: {}", script.display()));
        }
        let python_exe = resolve_python_exe(&cfg.converter.python_exe);
        Ok(Self {
            cfg: cfg.clone(),
            script,
            python_exe,
        })
    }

    fn timeout(&self) -> Option<Duration> {
        match self.cfg.converter.timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    fn options(&self) -> ConvertOptions {
        let table_strategy = self.cfg.converter.table_strategy.trim();
        ConvertOptions {
            ignore_images: self.cfg.converter.ignore_images,
            page_chunks: false,
            table_strategy: (!table_strategy.is_empty()).then(|| table_strategy.to_string()),
        }
    }

    fn run_json<I: serde::Serialize, O: for<'de> serde::Deserialize<'de>>(
        &self,
        input: &I,
        timeout: Option<Duration>,
    ) -> Result<O> {
        debug!("python run {} timeout={:?}", self.script.display(), timeout);
        let mut cmd = Command::new(&self.python_exe);
        cmd.arg(&self.script);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        for (k, v) in &self.cfg.converter.env {
            cmd.env(k, v);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning python: {}", self.python_exe.display()))?;

        send_request(&mut child, input)?;

        let output = match timeout {
            Some(limit) => wait_with_timeout(&mut child, limit)?,
            None => child
                .wait_with_output()
                .with_context(|| "waiting for python")?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("python runner failed ({}): {}", output.status, stderr.trim()));
        }

        if self.cfg.converter.keep_python_stderr && !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("python stderr: {}", stderr.trim());
        }

        let out: O = serde_json::from_slice(&output.stdout)
            .with_context(|| "parsing python JSON output")?;
        Ok(out)
    }
}

fn resolve_python_exe(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
        if let Ok(env_val) = std::env::var("PDF_HARVEST_PYTHON") {
            let p = expand_tilde(&env_val);
            if p.exists() {
                return p;
            }
        }
        let venv = PathBuf::from(".venv/bin/python");
        if venv.exists() {
            return venv;
        }
        return PathBuf::from("python3");
    }
    expand_tilde(raw)
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

/// Writes the JSON request and closes stdin. On failure the child is killed
/// and reaped before the error is returned.
fn send_request<I: serde::Serialize>(child: &mut Child, input: &I) -> Result<()> {
    let written = (|| -> Result<()> {
        let mut stdin = child.stdin.take().ok_or_else(|| anyhow!("no stdin"))?;
        let bytes = serde_json::to_vec(input)?;
        stdin
            .write_all(&bytes)
            .with_context(|| "writing request to python")?;
        stdin.flush().ok();
        Ok(())
    })();

    if written.is_err() {
        let _ = child.kill();
        let _ = child.wait();
    }
    written
}

impl Engine for PythonEngine {
    fn doctor(&self) -> Result<DocDiag> {
        self.run_json::<serde_json::Value, DocDiag>(
            &serde_json::json!({"cmd": "doctor"}),
            Some(Duration::from_secs(60)),
        )
    }

    fn to_markdown(&self, input: &Path) -> Result<String> {
        let req = serde_json::json!({
            "cmd": "convert",
            "req": ConvertIn {
                input_pdf: input.display().to_string(),
                options: self.options(),
            },
        });
        let out: ConvertOut = self
            .run_json(&req, self.timeout())
            .with_context(|| format!("convert {}", input.display()))?;
        if !out.ok {
            let msg = out.error.unwrap_or_else(|| "conversion failed".to_string());
            return Err(anyhow!(msg));
        }
        Ok(out.markdown)
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output> {
    // Drain pipes while waiting so a chatty converter can't block on a full buffer.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf).with_context(|| "read stdout")?;
        }
        Ok(buf)
    });

    let stderr_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf).with_context(|| "read stderr")?;
        }
        Ok(buf)
    });

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().with_context(|| "try_wait")? {
            let stdout = stdout_thread
                .join()
                .map_err(|_| anyhow!("stdout reader thread panicked"))??;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if start.elapsed() > timeout {
            warn!("python process timed out after {:?}", timeout);
            let _ = child.kill();
            child.wait().with_context(|| "wait after kill")?;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            let _ = stdout_thread.join();
            return Err(anyhow!(
                "python process exceeded timeout ({:?}); stderr: {}",
                timeout,
                String::from_utf8_lossy(&stderr).trim()
            ));
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}

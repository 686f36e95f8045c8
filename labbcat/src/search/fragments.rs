//! Downloading the audio, or a transcription, of parts of transcripts.

use super::matches::Match;
use crate::client::access::Access;
use crate::errors::LabbcatError;
use crate::requests::Params;
use crate::types::{LayerId, MimeType, TranscriptId};
use crate::LabbcatClient;
use bytes::Buf;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err::tokio::File;
use futures::future::BoxFuture;
use futures::{Stream, TryStreamExt};
use log::{debug, warn};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::StatusCode;
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::future::IntoFuture;
use tempfile::TempDir;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

/// A part of a transcript, between two offsets in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentTarget {
    pub transcript: TranscriptId,
    pub start: f64,
    pub end: f64,
}

impl FragmentTarget {
    pub fn new(transcript: TranscriptId, start: f64, end: f64) -> Self {
        Self {
            transcript,
            start,
            end,
        }
    }

    /// The utterance containing a match. `None` if the match has no utterance offsets.
    pub fn of(m: &Match) -> Option<Self> {
        Some(Self::new(
            m.transcript.clone(),
            m.utterance_start?,
            m.utterance_end?,
        ))
    }

    /// Combine parallel lists of transcript IDs, start offsets and end offsets.
    pub fn from_parallel(
        transcripts: &[TranscriptId],
        starts: &[f64],
        ends: &[f64],
    ) -> Result<Vec<Option<Self>>, LabbcatError> {
        if transcripts.len() != starts.len() || transcripts.len() != ends.len() {
            return Err(LabbcatError::InvalidArgument(format!(
                "{} transcript IDs, {} start offsets and {} end offsets: lengths must be equal",
                transcripts.len(),
                starts.len(),
                ends.len()
            )));
        }
        Ok(itertools::izip!(transcripts, starts, ends)
            .map(|(t, s, e)| Some(Self::new(t.clone(), *s, *e)))
            .collect())
    }

    /// File name to use when the server does not suggest one,
    /// e.g. `AP511_MikeThorpe__1.200-3.400`
    pub fn fallback_name(&self) -> String {
        let transcript = self.transcript.as_str();
        let stem = match transcript.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => transcript,
        };
        format!("{}__{:.3}-{:.3}", stem, self.start, self.end)
    }
}

impl fmt::Display for FragmentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.transcript, self.start, self.end)
    }
}

/// The file name suggested by a `Content-Disposition` header. An RFC 5987
/// `filename*` field is preferred to `filename`.
pub fn suggested_file_name(content_disposition: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for field in header_fields(content_disposition) {
        let Some((name, value)) = field.split_once('=') else {
            continue;
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(unquote(value.trim())),
            "filename*" => extended = decode_extended(value.trim()),
            _ => {}
        }
    }
    extended
        .or(plain)
        .as_deref()
        .and_then(|name| Utf8Path::new(name).file_name())
        .filter(|name| *name != "..")
        .map(str::to_string)
}

/// Split header parameters on `;`, except within quoted strings.
fn header_fields(header: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in header.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                fields.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&header[start..]);
    fields
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

/// `charset'language'percent-encoded-name`
fn decode_extended(value: &str) -> Option<String> {
    let encoded = value.splitn(3, '\'').nth(2).unwrap_or(value);
    urlencoding::decode(encoded).ok().map(|name| name.into_owned())
}

enum FragmentKind {
    Audio {
        sample_rate: Option<u32>,
    },
    Transcript {
        layer_ids: Vec<LayerId>,
        mime_type: MimeType,
    },
}

impl FragmentKind {
    fn resource(&self) -> &'static str {
        match self {
            Self::Audio { .. } => "soundfragment",
            Self::Transcript { .. } => "api/serialize/fragment",
        }
    }

    fn accept(&self) -> &str {
        match self {
            Self::Audio { .. } => "audio/wav",
            Self::Transcript { mime_type, .. } => mime_type.as_str(),
        }
    }

    fn temp_prefix(&self) -> &'static str {
        match self {
            Self::Audio { .. } => "getSoundFragments_",
            Self::Transcript { .. } => "getFragments_",
        }
    }

    fn params(&self, target: &FragmentTarget) -> Params {
        let params = Params::new()
            .add("id", &target.transcript)
            .add("start", target.start)
            .add("end", target.end);
        match self {
            Self::Audio { sample_rate } => params.add_opt("sampleRate", *sample_rate),
            Self::Transcript {
                layer_ids,
                mime_type,
            } => params
                .add("mimeType", mime_type)
                .add_all("layerId", layer_ids),
        }
    }

    fn fallback_name(&self, target: &FragmentTarget) -> String {
        match self {
            Self::Audio { .. } => format!("{}.wav", target.fallback_name()),
            Self::Transcript { .. } => target.fallback_name(),
        }
    }
}

enum FragmentDir {
    Temporary(TempDir),
    Given,
}

/// Downloaded fragments, in the order they were requested.
///
/// A temporary directory created for them is deleted when this is dropped, unless
/// it is [kept](Fragments::keep).
pub struct Fragments {
    files: Vec<Option<Utf8PathBuf>>,
    dir: FragmentDir,
    dir_path: Utf8PathBuf,
}

impl Fragments {
    /// A path for each requested fragment, `None` where the fragment could not be
    /// downloaded.
    pub fn files(&self) -> &[Option<Utf8PathBuf>] {
        &self.files
    }

    /// The directory the fragments were saved in.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir_path
    }

    /// Stop a temporary directory from being deleted.
    pub fn keep(self) -> (Vec<Option<Utf8PathBuf>>, Utf8PathBuf) {
        if let FragmentDir::Temporary(dir) = self.dir {
            let _ = dir.into_path();
        }
        (self.files, self.dir_path)
    }
}

/// Request for fragments, created by [LabbcatClient::get_sound_fragments] or
/// [LabbcatClient::get_fragments].
///
/// A fragment which cannot be downloaded does not stop the others from being downloaded.
#[must_use = "does nothing unless awaited"]
pub struct GetFragments<'a, A: Access> {
    client: &'a LabbcatClient<A>,
    targets: Vec<Option<FragmentTarget>>,
    kind: FragmentKind,
    dir: Option<Utf8PathBuf>,
    cancel: CancellationToken,
}

impl<'a, A: Access> GetFragments<'a, A> {
    /// Save fragments in this directory, which is created if it does not exist.
    /// By default, a temporary directory is created.
    pub fn destination(self, dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..self
        }
    }

    /// Stop downloading when `cancel` is triggered. Fragments already downloaded are kept.
    pub fn with_cancellation(self, cancel: CancellationToken) -> Self {
        Self { cancel, ..self }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn fetch(self) -> Result<Fragments, LabbcatError> {
        let (dir, dir_path) = match &self.dir {
            Some(path) => {
                fs_err::tokio::create_dir_all(path).await?;
                (FragmentDir::Given, path.clone())
            }
            None => {
                let dir = tempfile::Builder::new()
                    .prefix(self.kind.temp_prefix())
                    .tempdir()?;
                let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).map_err(|p| {
                    LabbcatError::InvalidArgument(format!(
                        "Temporary directory is not UTF-8: {}",
                        p.display()
                    ))
                })?;
                (FragmentDir::Temporary(dir), path)
            }
        };

        let mut files = vec![None; self.targets.len()];
        let mut names = HashSet::new();
        for (file, target) in files.iter_mut().zip(&self.targets) {
            if self.cancel.is_cancelled() {
                debug!("fragment downloads cancelled");
                break;
            }
            let Some(target) = target else {
                continue;
            };
            match self.download(target, &dir_path, &mut names).await {
                Ok(path) => *file = path,
                Err(LabbcatError::Auth(e)) => return Err(e.into()),
                Err(e) => warn!("Could not get fragment {}: {}", target, e),
            }
        }
        Ok(Fragments {
            files,
            dir,
            dir_path,
        })
    }

    /// Download one fragment. `None` if the server does not have it.
    async fn download(
        &self,
        target: &FragmentTarget,
        dir: &Utf8Path,
        names: &mut HashSet<String>,
    ) -> Result<Option<Utf8PathBuf>, LabbcatError> {
        let res = self
            .client
            .session
            .download(
                self.kind.resource(),
                &self.kind.params(target),
                self.kind.accept(),
            )
            .await?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            debug!("no fragment {}", target);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(LabbcatError::Http {
                status,
                reason: status.canonical_reason().unwrap_or("unknown reason"),
                text: res.text().await.unwrap_or_default(),
            });
        }
        let name = res
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(suggested_file_name)
            .unwrap_or_else(|| self.kind.fallback_name(target));
        let path = dir.join(unique_name(&name, names));
        let stream = res
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::ConnectionAborted, e));
        save(stream, &path).await?;
        debug!("saved {}", path);
        Ok(Some(path))
    }
}

/// `name`, or `name` numbered before its extension if it was already used.
fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = name.to_string();
    let mut n = 1;
    while used.contains(&candidate) {
        candidate = match name.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => {
                format!("{}-{}.{}", stem, n, extension)
            }
            _ => format!("{}-{}", name, n),
        };
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Write a stream to a new file. A partly written file is removed.
async fn save<S, B>(stream: S, path: &Utf8Path) -> Result<(), LabbcatError>
where
    S: Stream<Item = io::Result<B>>,
    B: Buf,
{
    let mut file = File::create(path).await?;
    let reader = StreamReader::new(stream);
    tokio::pin!(reader);
    if let Err(e) = tokio::io::copy(&mut reader, &mut file).await {
        drop(file);
        if let Err(removal) = fs_err::tokio::remove_file(path).await {
            debug!("{}", removal);
        }
        return Err(e.into());
    }
    Ok(())
}

impl<'a, A: Access> IntoFuture for GetFragments<'a, A> {
    type Output = Result<Fragments, LabbcatError>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.fetch())
    }
}

impl<A: Access> LabbcatClient<A> {
    /// Download WAV audio of the utterances containing matches.
    pub fn get_sound_fragments(&self, matches: &[Match]) -> GetFragments<'_, A> {
        self.get_sound_fragments_of(matches.iter().map(FragmentTarget::of).collect())
    }

    /// Download WAV audio of parts of transcripts.
    pub fn get_sound_fragments_of(
        &self,
        targets: Vec<Option<FragmentTarget>>,
    ) -> GetFragments<'_, A> {
        self.fragments(targets, FragmentKind::Audio { sample_rate: None })
    }

    /// Download transcriptions of the utterances containing matches, in a given format,
    /// including annotations on the given layers.
    pub fn get_fragments(
        &self,
        matches: &[Match],
        layer_ids: &[LayerId],
        mime_type: MimeType,
    ) -> GetFragments<'_, A> {
        self.get_fragments_of(
            matches.iter().map(FragmentTarget::of).collect(),
            layer_ids,
            mime_type,
        )
    }

    /// Download transcriptions of parts of transcripts.
    pub fn get_fragments_of(
        &self,
        targets: Vec<Option<FragmentTarget>>,
        layer_ids: &[LayerId],
        mime_type: MimeType,
    ) -> GetFragments<'_, A> {
        self.fragments(
            targets,
            FragmentKind::Transcript {
                layer_ids: layer_ids.to_vec(),
                mime_type,
            },
        )
    }

    fn fragments(
        &self,
        targets: Vec<Option<FragmentTarget>>,
        kind: FragmentKind,
    ) -> GetFragments<'_, A> {
        GetFragments {
            client: self,
            targets,
            kind,
            dir: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl<'a, A: Access> GetFragments<'a, A> {
    /// Resample audio to this rate, in Hz. Has no effect on transcript fragments.
    pub fn sample_rate(mut self, rate: u32) -> Self {
        if let FragmentKind::Audio { sample_rate } = &mut self.kind {
            *sample_rate = Some(rate);
        }
        self
    }
}

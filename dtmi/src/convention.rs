//! Mapping between identifiers and repository-relative file paths.

use crate::id::Dtmi;
use crate::id::SCHEME;

/// Storage form of a model document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelForm {
    /// The interface exactly as authored.
    Standard,
    /// A pre-assembled JSON array holding the interface together with every
    /// model in its dependency closure.
    Expanded,
}

impl ModelForm {
    fn suffix(self) -> &'static str {
        match self {
            ModelForm::Standard => ".json",
            ModelForm::Expanded => ".expanded.json",
        }
    }
}

/// Well-known metadata document, relative to the repository root.
pub const METADATA_PATH: &str = "metadata.json";

/// Renders the repository-relative path of `dtmi` in the requested form.
///
/// Segments fold to lowercase and join with `/` under the scheme root; the
/// version becomes a `-<version>` suffix:
///
/// ```
/// use dmr_dtmi::Dtmi;
/// use dmr_dtmi::ModelForm;
/// use dmr_dtmi::model_repo_path;
///
/// let id: Dtmi = "dtmi:com:example:Thermostat;1".parse()?;
/// assert_eq!(
///     model_repo_path(&id, ModelForm::Standard),
///     "dtmi/com/example/thermostat-1.json",
/// );
/// # Ok::<(), dmr_dtmi::DtmiParseError>(())
/// ```
pub fn model_repo_path(dtmi: &Dtmi, form: ModelForm) -> String {
    let mut path =
        String::with_capacity(dtmi.as_str().len() + ModelForm::Expanded.suffix().len());
    path.push_str(SCHEME);
    for segment in dtmi.segments() {
        path.push('/');
        path.push_str(&segment.to_ascii_lowercase());
    }
    path.push('-');
    path.push_str(&dtmi.version().to_string());
    path.push_str(form.suffix());
    path
}

use aliri_braid::braid;

/// LaBB-CAT username
#[braid(serde)]
pub struct Username;

/// Content type of a serialized transcript fragment, e.g. `text/praat-textgrid`
#[braid(serde)]
pub struct MimeType;

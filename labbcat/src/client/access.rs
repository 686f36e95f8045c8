/// An indicator of which LaBB-CAT APIs a client may call.
pub trait Access: Send + Sync + 'static {}

/// Read-only access to annotations, searches and media.
#[derive(Debug)]
pub struct ViewAccess;

/// [ViewAccess] plus the ability to add, change and delete transcripts.
#[derive(Debug)]
pub struct EditAccess;

/// [EditAccess] plus system administration.
#[derive(Debug)]
pub struct AdminAccess;

impl Access for ViewAccess {}
impl Access for EditAccess {}
impl Access for AdminAccess {}

/// Access which permits editing.
pub trait CanEdit: Access {}

impl CanEdit for EditAccess {}
impl CanEdit for AdminAccess {}

/// Access which permits administration.
pub trait CanAdmin: CanEdit {}

impl CanAdmin for AdminAccess {}

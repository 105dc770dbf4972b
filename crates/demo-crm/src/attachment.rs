use crm_orm::Model;

/// A polymorphic attachment: `res_model`/`res_id` point at the owning row on
/// whichever table declared a `polymorphic_one2many` field back to this one
/// (`ChatMessage::images`, here) rather than a fixed foreign key.
#[derive(Model)]
#[orm(table = "attachment")]
pub struct Attachment {
    #[orm(primary_key)]
    pub id: i32,
    #[orm(char(max_length = 255), required)]
    pub name: String,
    #[orm(char(max_length = 64), required)]
    pub res_model: String,
    #[orm(null = true)]
    pub res_id: Option<i32>,
    #[orm(null = true, char(max_length = 128))]
    pub mimetype: Option<String>,
}

use crm_orm::Model;

#[derive(Model)]
#[orm(table = "chat_message")]
pub struct ChatMessage {
    #[orm(primary_key)]
    pub id: i32,
    #[orm(null = true)]
    pub body: Option<String>,
    #[orm(null = true, char(max_length = 255))]
    pub subject: Option<String>,
    #[orm(
        selection(comment = "Comment", notification = "Notification", system = "System", email = "Email"),
        default = "comment",
        required
    )]
    pub message_type: String,
    #[orm(null = true, ondelete = "set_null", many2one(target = "user"))]
    pub author_user_id: Option<i32>,
    #[orm(default = false, required)]
    pub is_read: bool,
    #[orm(default = false, required)]
    pub is_deleted: bool,
    #[orm(default = false, required)]
    pub starred: bool,
    #[orm(default = false, required)]
    pub pinned: bool,
    #[orm(as_name = "image_ids", polymorphic_one2many(target = "attachment", back_field = "res_id"))]
    pub images: (),
}

use clap::{Parser, Subcommand};

/// workhub-notify — real-time notification delivery service
#[derive(Parser)]
#[command(name = "workhub-notify", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the notification server
    Serve {
        /// Port to bind (overrides WORKHUB_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Run against an in-memory store instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },

    /// Persist a notification fan-out directly against the store.
    ///
    /// Ops helper for re-deriving dropped notifications. Live push only
    /// reaches clients connected to a running server process, so this
    /// command stores rows; connected clients pick them up on reconnect.
    Publish {
        /// Receiver user ids
        #[arg(long, value_delimiter = ',', required = true)]
        receivers: Vec<i64>,

        /// Notification type, e.g. POST_COMMENT_CREATED
        #[arg(long = "type")]
        notification_type: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(long)]
        related_url: Option<String>,

        // Exactly one of the related-entity ids must be given.
        #[arg(long)]
        project_id: Option<i64>,

        #[arg(long)]
        project_node_id: Option<i64>,

        #[arg(long)]
        post_id: Option<i64>,

        #[arg(long)]
        comment_id: Option<i64>,

        #[arg(long)]
        cs_qna_id: Option<i64>,

        #[arg(long)]
        cs_post_id: Option<i64>,
    },
}

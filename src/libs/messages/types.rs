#[derive(Debug, Clone)]
pub enum Message {
    // === TASK MESSAGES ===
    TasksHeader,
    TasksEmpty,
    TasksLoaded(usize),
    TaskAdded(String),
    TaskUpdated(usize),
    TaskDeleted(String),
    TaskMoved(usize, usize),
    TaskCompleted(String),
    TaskReopened(String),
    TaskIndexOutOfRange(usize, usize), // number, list length
    HeaderCannotBeToggled(usize),
    ConfirmDeleteHeader { text: String, items: usize },
    DeleteCancelled,
    FilterShowAll,
    FilterHideCompleted,

    // === SAVE MESSAGES ===
    TasksSaved(String), // lastSaved
    NothingToSave,
    SaveFailed(String),
    LoadFailed(String),
    UnsavedChangesRemain,

    // === SHELL MESSAGES ===
    ShellWelcome,
    ShellUnknownCommand(String),
    ShellUsage(String),
    ShellGoodbye,

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigModuleServer,
    ConfigModuleClient,
    ClientConfigMissing,
    AdminCredentialsMissing,

    // === SERVER MESSAGES ===
    ServerListening(String),
    ServerDataFile(String),
    ServerShuttingDown,
    ServerSignalHandlerFailed(String),

    // === AUTHENTICATION MESSAGES ===
    LoginSucceeded(String),
    LoggedOut,
    NotLoggedIn,
    SessionExpired,
    SessionRestored,
    WrongPassword(i32), // attempt count
    AuthStatus(bool),
    TooManyLoginAttempts,

    // === PROMPTS ===
    PromptSelectModules,
    PromptServerHost,
    PromptServerPort,
    PromptServerDataDir,
    PromptSessionTtl,
    PromptApiUrl,
    PromptUsername,
    PromptAutosaveDelay,
    PromptPassword,
}

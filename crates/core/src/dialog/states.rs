#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingPhone,
    AwaitingName,
    SelectingProducts,
    SelectingQuantity,
    AwaitingTotal,
    Confirming,
}

/// Product picked from the menu whose quantity has not been chosen yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductSelection {
    pub name: String,
    pub variant: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    pub variant: Option<String>,
    pub quantity: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaleDraft {
    pub phone: Option<String>,
    pub customer_name: Option<String>,
    pub customer_id: Option<String>,
    pub new_customer: bool,
    pub lines: Vec<LineItem>,
    pub pending: Option<ProductSelection>,
    pub total: Option<i64>,
}

impl SaleDraft {
    pub fn add_line(&mut self, line: LineItem) {
        self.lines.push(line);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationSession {
    pub state: DialogState,
    pub draft: SaleDraft,
}

impl ConversationSession {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

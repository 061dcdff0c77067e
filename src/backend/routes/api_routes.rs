/**
 * API Routes
 *
 * # Routes
 *
 * ## Rooms
 * - `GET /api/rooms` - List rooms with access flags
 * - `POST /api/rooms` - Create a room (ADMIN)
 * - `GET /api/rooms/{id}` - Room details
 * - `DELETE /api/rooms/{id}` - Delete a room and its content (ADMIN)
 * - `POST /api/rooms/{id}/join` - Enter a room
 * - `GET /api/rooms/{id}/messages` - Room history
 * - `PUT /api/rooms/{id}/participants` - Replace participants (ADMIN)
 * - `PATCH /api/rooms/{id}/archive` - Archive (ADMIN)
 * - `GET /api/rooms/{id}/presence` - Participant online state
 * - `GET /api/rooms/{id}/tasks` - Room tasks
 * - `POST /api/rooms/{id}/tasks` - Create a task
 *
 * ## Tasks
 * - `POST /api/tasks/from-message` - Convert a message into a task
 * - `PATCH /api/tasks/{id}` - Update a task
 * - `DELETE /api/tasks/{id}` - Delete a task
 *
 * ## Chat
 * - `POST /api/chat/messages` - Send a room or conversation message
 * - `GET /api/chat/messages/{conversation_id}` - Conversation history
 * - `GET /api/chat/conversations` - The caller's conversations
 * - `POST /api/chat/conversations` - Find or open a conversation
 * - `GET /api/chat/users?search=` - Search other principals by name
 * - `GET /api/chat/members` - All MEMBER principals
 *
 * ## Focus
 * - `POST /api/focus/start` - Start a focus session
 * - `POST /api/focus/stop` - Stop the active session
 * - `GET /api/focus/stats` - Recent sessions
 *
 * # Authentication
 *
 * Every route requires a JWT in the `Authorization` header; handlers take
 * the `AuthUser` extractor.
 */

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::backend::server::state::AppState;
use crate::backend::{chat, focus, rooms, tasks};

/// Configure API routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        // Rooms
        .route("/api/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route(
            "/api/rooms/{id}",
            get(rooms::get_room).delete(rooms::delete_room),
        )
        .route("/api/rooms/{id}/join", post(rooms::enter_room))
        .route("/api/rooms/{id}/messages", get(rooms::room_messages))
        .route("/api/rooms/{id}/participants", put(rooms::update_participants))
        .route("/api/rooms/{id}/archive", patch(rooms::archive_room))
        .route("/api/rooms/{id}/presence", get(rooms::room_presence))
        .route(
            "/api/rooms/{id}/tasks",
            get(tasks::list_tasks).post(tasks::create_task),
        )
        // Tasks
        .route("/api/tasks/from-message", post(tasks::convert_message_to_task))
        .route(
            "/api/tasks/{id}",
            patch(tasks::update_task).delete(tasks::delete_task),
        )
        // Chat
        .route("/api/chat/messages", post(chat::send_message))
        .route(
            "/api/chat/messages/{conversation_id}",
            get(chat::conversation_messages),
        )
        .route(
            "/api/chat/conversations",
            get(chat::list_conversations).post(chat::access_conversation),
        )
        .route("/api/chat/users", get(chat::search_users))
        .route("/api/chat/members", get(chat::list_members))
        // Focus
        .route("/api/focus/start", post(focus::start_focus))
        .route("/api/focus/stop", post(focus::stop_focus))
        .route("/api/focus/stats", get(focus::focus_stats))
}

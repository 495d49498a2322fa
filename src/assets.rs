//! Static page, client script and stylesheet, embedded in the binary.

/// Chat page markup.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Chat Relay</title>
<link rel="stylesheet" href="/style.css">
</head>
<body>
<header><h1>Chat Relay</h1><span class="hint">Everyone here shares one room. Claude answers every message.</span></header>
<main>
  <div id="messages" aria-live="polite"></div>
  <form id="message-form" autocomplete="off">
    <input type="text" id="username" placeholder="Your name" maxlength="64" required>
    <input type="text" id="message-input" placeholder="Type a message..." required>
    <button type="submit" class="btn-send">Send</button>
  </form>
</main>
<script src="/script.js"></script>
</body>
</html>"##;

/// Client poller: fetches the full history every two seconds and posts new
/// messages. Text is rendered through `textContent`, never as markup.
pub const SCRIPT_JS: &str = r##"const POLL_INTERVAL_MS = 2000;
const SYNTHETIC_AUTHOR = 'claude';

const messagesDiv = document.getElementById('messages');
const messageForm = document.getElementById('message-form');
const usernameInput = document.getElementById('username');
const messageInput = document.getElementById('message-input');

async function loadMessages() {
  try {
    const response = await fetch('/messages');
    const messages = await response.json();
    displayMessages(messages);
  } catch (error) {
    console.error('Error loading messages:', error);
  }
}

function field(cls, text) {
  const div = document.createElement('div');
  div.className = cls;
  div.textContent = text;
  return div;
}

function displayMessages(messages) {
  messagesDiv.replaceChildren();
  messages.forEach(msg => {
    const messageDiv = document.createElement('div');
    messageDiv.className = 'message';
    if (String(msg.username).toLowerCase() === SYNTHETIC_AUTHOR) {
      messageDiv.setAttribute('data-claude', 'true');
    }
    messageDiv.appendChild(field('username', msg.username));
    messageDiv.appendChild(field('message-text', msg.message));
    messageDiv.appendChild(field('timestamp', new Date(msg.timestamp).toLocaleString()));
    messagesDiv.appendChild(messageDiv);
  });
  messagesDiv.scrollTop = messagesDiv.scrollHeight;
}

messageForm.addEventListener('submit', async (e) => {
  e.preventDefault();
  const username = usernameInput.value.trim();
  const message = messageInput.value.trim();
  if (!username || !message) return;

  try {
    const response = await fetch('/messages', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ username, message })
    });
    if (response.ok) {
      messageInput.value = '';
      loadMessages();
    }
  } catch (error) {
    console.error('Error sending message:', error);
  }
});

loadMessages();
setInterval(loadMessages, POLL_INTERVAL_MS);
"##;

pub const STYLE_CSS: &str = r##"*{margin:0;padding:0;box-sizing:border-box}
body{background:#0d1117;color:#c9d1d9;font-family:-apple-system,'Segoe UI',Helvetica,Arial,sans-serif;min-height:100vh;display:flex;flex-direction:column}
header{padding:14px 24px;border-bottom:1px solid #21262d;display:flex;align-items:baseline;gap:16px}
header h1{font-size:1.2rem;color:#58a6ff}
.hint{font-size:.8rem;color:#8b949e}
main{flex:1;display:flex;flex-direction:column;max-width:820px;width:100%;margin:0 auto;padding:16px}
#messages{flex:1;overflow-y:auto;min-height:300px;max-height:calc(100vh - 160px);display:flex;flex-direction:column;gap:8px;padding-bottom:8px}
.message{background:#161b22;border:1px solid #21262d;border-radius:8px;padding:8px 12px}
.message[data-claude="true"]{background:#11203a;border-color:#1f6feb}
.message[data-claude="true"] .username{color:#d2a8ff}
.username{font-weight:bold;font-size:.85rem;color:#58a6ff;margin-bottom:2px}
.message-text{white-space:pre-wrap;word-wrap:break-word;line-height:1.5}
.timestamp{font-size:.7rem;color:#484f58;margin-top:4px}
#message-form{display:flex;gap:8px;padding-top:12px;border-top:1px solid #21262d}
#message-form input{background:#0d1117;border:1px solid #30363d;color:#c9d1d9;padding:8px 10px;border-radius:6px;font-size:.9rem}
#message-form input:focus{outline:none;border-color:#58a6ff}
#username{width:140px}
#message-input{flex:1}
.btn-send{border:none;padding:8px 16px;border-radius:6px;background:#238636;color:#fff;cursor:pointer;font-size:.9rem}
.btn-send:hover{background:#2ea043}
"##;

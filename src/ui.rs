pub fn embedded(path: &str) -> Option<&'static str> {
    match path {
        "index.html" => Some(INDEX_HTML),
        "about.html" => Some(ABOUT_HTML),
        "manifest.json" => Some(MANIFEST_JSON),
        "assets/style.css" => Some(STYLE_CSS),
        "assets/main.js" => Some(MAIN_JS),
        "assets/icon.svg" => Some(ICON_SVG),
        _ => None,
    }
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <meta name="theme-color" content="#2f4858" />
  <title>PWA Timer</title>
  <link rel="manifest" href="manifest.json" />
  <link rel="icon" href="assets/icon.svg" type="image/svg+xml" />
  <link rel="stylesheet" href="_remote?url=https%3A%2F%2Ffonts.googleapis.com%2Fcss%3Ffamily%3DShare%2BTech%2BMono%26display%3Dswap" />
  <link rel="stylesheet" href="assets/style.css" />
</head>
<body>
  <main class="app" data-js="app" hidden>
    <header>
      <h1>PWA Timer</h1>
      <button class="ghost" data-js="openAbout" type="button">About</button>
    </header>

    <div class="count" data-js="count">0:00</div>

    <div class="actions">
      <button data-js="timer-5sec" type="button">5 sec</button>
      <button data-js="timer-3min" type="button">3 min</button>
      <button class="stop" data-js="stop" type="button">Stop</button>
    </div>

    <label class="toggle">
      <input data-js="notificationEnabled" type="checkbox" />
      Notify me when time is up
    </label>

    <p class="status" data-js="connection">Connecting...</p>
  </main>

  <script src="assets/main.js"></script>
</body>
</html>
"##;

const ABOUT_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>About - PWA Timer</title>
  <link rel="manifest" href="manifest.json" />
  <link rel="icon" href="assets/icon.svg" type="image/svg+xml" />
  <link rel="stylesheet" href="assets/style.css" />
</head>
<body>
  <main class="app">
    <header>
      <h1>About</h1>
      <a class="ghost" href="./">Back</a>
    </header>
    <p>
      A countdown timer that keeps running while this page is closed. The
      server owns the countdown; every open tab shows the same one and can
      start or stop it.
    </p>
    <p>
      Pages and fonts are served from an offline cache. When a new version is
      deployed you will be asked to reload.
    </p>
  </main>
</body>
</html>
"##;

const MANIFEST_JSON: &str = r##"{
  "name": "PWA Timer",
  "short_name": "Timer",
  "start_url": "./",
  "scope": "./",
  "display": "standalone",
  "background_color": "#f8f3e6",
  "theme_color": "#2f4858",
  "icons": [
    {
      "src": "assets/icon.svg",
      "sizes": "any",
      "type": "image/svg+xml"
    }
  ]
}
"##;

const STYLE_CSS: &str = r##":root {
  --bg-1: #f8f3e6;
  --bg-2: #f5d3a7;
  --ink: #2b2a28;
  --accent: #ff6b4a;
  --accent-2: #2f4858;
  --card: rgba(255, 255, 255, 0.86);
  --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
}

* {
  box-sizing: border-box;
}

body {
  margin: 0;
  min-height: 100vh;
  background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
    linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
  color: var(--ink);
  font-family: "Trebuchet MS", sans-serif;
  display: grid;
  place-items: center;
  padding: 32px 18px 48px;
}

.app {
  width: min(520px, 100%);
  background: var(--card);
  backdrop-filter: blur(12px);
  border-radius: 28px;
  box-shadow: var(--shadow);
  padding: 32px;
}

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
}

h1 {
  margin: 0;
  font-size: 1.6rem;
  color: var(--accent-2);
}

.count {
  font-family: "Share Tech Mono", monospace;
  font-size: clamp(4rem, 18vw, 7rem);
  text-align: center;
  margin: 28px 0;
  font-variant-numeric: tabular-nums;
}

.actions {
  display: flex;
  gap: 12px;
  justify-content: center;
}

button,
a.ghost {
  border: none;
  border-radius: 999px;
  padding: 12px 22px;
  font: inherit;
  font-weight: 600;
  cursor: pointer;
  background: var(--accent-2);
  color: #fff;
  text-decoration: none;
}

button.stop {
  background: var(--accent);
}

button.ghost,
a.ghost {
  background: transparent;
  color: var(--accent-2);
  border: 1px solid var(--accent-2);
  padding: 6px 16px;
}

.toggle {
  display: flex;
  gap: 8px;
  align-items: center;
  justify-content: center;
  margin-top: 24px;
}

.status {
  text-align: center;
  font-size: 0.85rem;
  opacity: 0.6;
}
"##;

const MAIN_JS: &str = r##"(() => {
  'use strict';

  const RECONNECT_MS = 2000;
  const WAITING_SETTLE_MS = 500;

  function findElement(name) {
    const el = document.querySelector(`[data-js="${name}"]`);
    if (!el) {
      throw new Error(`Element named ${name} is not found`);
    }
    return el;
  }

  function sleep(ms) {
    return new Promise((resolve) => setTimeout(resolve, ms));
  }

  const elApp = findElement('app');
  const elCount = findElement('count');
  const elConnection = findElement('connection');
  const elNotificationEnabled = findElement('notificationEnabled');

  let socket = null;
  let audio = null;
  let permissionRetried = false;

  function send(message) {
    if (socket && socket.readyState === WebSocket.OPEN) {
      socket.send(JSON.stringify(message));
    }
  }

  function renderCount(remaining) {
    if (!remaining || remaining < 0) {
      elCount.textContent = '0:00';
      return;
    }
    const seconds = Math.ceil(remaining / 1000);
    const m = Math.floor(seconds / 60);
    const ss = `0${seconds % 60}`.slice(-2);
    const text = `${m}:${ss}`;
    if (elCount.textContent !== text) {
      elCount.textContent = text;
    }
  }

  function ring() {
    stopRinging();
    try {
      audio = new AudioContext();
      const osc = audio.createOscillator();
      const gain = audio.createGain();
      osc.frequency.value = 880;
      gain.gain.setValueAtTime(0.2, audio.currentTime);
      gain.gain.exponentialRampToValueAtTime(0.001, audio.currentTime + 1.5);
      osc.connect(gain).connect(audio.destination);
      osc.start();
      osc.stop(audio.currentTime + 1.5);
    } catch (error) {
      console.error(error);
    }
  }

  function stopRinging() {
    if (audio) {
      audio.close();
      audio = null;
    }
  }

  function showNotification(body) {
    if (!('Notification' in window) || Notification.permission !== 'granted') {
      return;
    }
    new Notification('PWA Timer', { body, icon: 'assets/icon.svg' });
  }

  function setNotification(enabled) {
    if (!('Notification' in window)) {
      elNotificationEnabled.checked = false;
      return;
    }
    const { permission } = Notification;
    if (permission === 'granted') {
      elNotificationEnabled.checked = enabled;
      send({ type: 'preferences/notificationEnabled', notificationEnabled: enabled });
    } else if (permission === 'denied') {
      elNotificationEnabled.checked = false;
      window.alert('You have denied notifications. Change the site setting to enable them.');
    } else {
      elNotificationEnabled.checked = false;
      Notification.requestPermission().then((answer) => {
        if (answer === 'default') {
          if (permissionRetried) {
            window.alert('You may have to reload in order to update your decision.');
            return;
          }
          permissionRetried = true;
        }
        setNotification(enabled);
      });
    }
  }

  async function onMessage(message) {
    switch (message.type) {
      case 'sw/install':
        if (window.confirm('New version is available. Reload now?')) {
          send({ type: 'sw/skipWaiting' });
        }
        break;
      case 'sw/waiting':
        await sleep(WAITING_SETTLE_MS);
        send({ type: 'sw/skipWaiting' });
        break;
      case 'sw/activate':
        window.location.reload();
        break;
      case 'timer/start':
        stopRinging();
        break;
      case 'timer/stop':
        stopRinging();
        break;
      case 'timer/tick':
        renderCount(message.remaining);
        break;
      case 'timer/alarm':
        renderCount(0);
        ring();
        if (elNotificationEnabled.checked && document.hidden) {
          showNotification("It's time!");
        }
        break;
      case 'timer/status':
        renderCount(message.running ? message.remaining : 0);
        elNotificationEnabled.checked = message.preferences.notificationEnabled;
        elApp.hidden = false;
        break;
      default:
    }
  }

  function connect() {
    const url = new URL('ws', window.location.href);
    url.protocol = url.protocol === 'https:' ? 'wss:' : 'ws:';
    socket = new WebSocket(url);

    socket.addEventListener('open', () => {
      elConnection.textContent = '';
      send({ type: 'timer/requestStatus' });
    });
    socket.addEventListener('message', (event) => {
      let message;
      try {
        message = JSON.parse(event.data);
      } catch (error) {
        console.error(error);
        return;
      }
      onMessage(message);
    });
    socket.addEventListener('close', () => {
      elConnection.textContent = 'Offline, reconnecting...';
      setTimeout(connect, RECONNECT_MS);
    });
  }

  findElement('openAbout').onclick = () => {
    window.location.href = './about.html';
  };
  findElement('timer-5sec').onclick = () => send({ type: 'timer/start', duration: 5000 });
  findElement('timer-3min').onclick = () => send({ type: 'timer/start', duration: 3 * 60 * 1000 });
  findElement('stop').onclick = () => send({ type: 'timer/stop' });
  elNotificationEnabled.onclick = () => setNotification(elNotificationEnabled.checked);

  connect();
})();
"##;

const ICON_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 512 512">
  <rect width="512" height="512" rx="112" fill="#2f4858"/>
  <circle cx="256" cy="280" r="160" fill="#f8f3e6"/>
  <rect x="226" y="60" width="60" height="48" rx="12" fill="#f8f3e6"/>
  <path d="M256 280 L256 170" stroke="#ff6b4a" stroke-width="28" stroke-linecap="round"/>
  <path d="M256 280 L330 320" stroke="#2b2a28" stroke-width="20" stroke-linecap="round"/>
</svg>
"##;
